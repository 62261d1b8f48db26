//! SQL builder tests.

use vibequant::SqlBuilder;

#[test]
fn defaults_to_select_star() {
    let (sql, params) = SqlBuilder::new("original").build();
    assert_eq!(sql, "SELECT *\nFROM original");
    assert!(params.is_empty());
}

#[test]
fn full_query_layout() {
    let (sql, params) = SqlBuilder::new("range(1, 32) AS k(n)")
        .select(&["k.n AS n"])
        .select_more(vec!["AVG(o.c5) AS avg_change".to_string()])
        .join("LEFT JOIN original o ON o.c2 = k.n")
        .where_clause("o.c3 = ?", &["Monday"])
        .where_clause("o.c4 > ?", &["6"])
        .group_by(&["k.n"])
        .order_by(&["k.n"])
        .build();

    assert_eq!(
        sql,
        "SELECT k.n AS n, AVG(o.c5) AS avg_change\n\
         FROM range(1, 32) AS k(n)\n\
         LEFT JOIN original o ON o.c2 = k.n\n\
         WHERE o.c3 = ? AND o.c4 > ?\n\
         GROUP BY k.n\n\
         ORDER BY k.n"
    );
    assert_eq!(params, vec!["Monday", "6"]);
}

#[test]
fn select_replaces_star() {
    let (sql, _) = SqlBuilder::new("t").select(&[]).select_more(vec!["COUNT(*) AS n".into()]).build();
    assert_eq!(sql, "SELECT COUNT(*) AS n\nFROM t");
}

#[test]
fn group_and_order_accumulate() {
    let (sql, _) = SqlBuilder::new("t")
        .group_by(&["a"])
        .group_by(&["b"])
        .order_by(&["a DESC", "b"])
        .build();
    assert!(sql.ends_with("GROUP BY a, b\nORDER BY a DESC, b"));
}
