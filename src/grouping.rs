use crate::merger::sort_ledger;
use crate::schema::{GroupBy, GroupedBucket, LedgerRows, Transaction};
use std::collections::HashMap;

pub fn bucket_key(transaction: &Transaction, group_by: GroupBy) -> Option<String> {
    match group_by {
        GroupBy::None => None,
        GroupBy::Date => Some(transaction.short_date.clone()),
        GroupBy::Customer => Some(transaction.customer_name.clone()),
        GroupBy::TransactionType => Some(transaction.transaction_type.label().to_string()),
    }
}

/// Buckets a sorted ledger. Buckets keep first-seen order; they are never sorted by key.
pub fn group_ledger(ledger: Vec<Transaction>, group_by: GroupBy) -> LedgerRows {
    if group_by == GroupBy::None {
        return LedgerRows::Timeline(ledger);
    }

    let mut buckets: Vec<GroupedBucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for transaction in ledger {
        let key = match bucket_key(&transaction, group_by) {
            Some(key) => key,
            None => continue,
        };
        let index = *positions.entry(key.clone()).or_insert_with(|| {
            buckets.push(GroupedBucket {
                key,
                items: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[index].items.push(transaction);
    }

    for bucket in &mut buckets {
        sort_ledger(&mut bucket.items);
    }

    LedgerRows::Buckets(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::merge_ledger;
    use crate::merger::tests::{at, order_tx, payment_tx};

    fn sample_ledger() -> Vec<Transaction> {
        merge_ledger(
            vec![
                order_tx(1, "Zeta Haulage", at(2024, 1, 1, 9)),
                order_tx(2, "Alpha Stone", at(2024, 1, 2, 9)),
                order_tx(3, "Zeta Haulage", at(2024, 1, 3, 9)),
            ],
            vec![
                payment_tx(1, "Alpha Stone", at(2024, 1, 1, 10)),
                payment_tx(2, "Zeta Haulage", at(2024, 1, 3, 8)),
            ],
        )
    }

    fn buckets(rows: LedgerRows) -> Vec<GroupedBucket> {
        match rows {
            LedgerRows::Buckets(buckets) => buckets,
            LedgerRows::Timeline(_) => panic!("expected buckets"),
        }
    }

    #[test]
    fn test_none_returns_ledger_unchanged() {
        let ledger = sample_ledger();
        let rows = group_ledger(ledger.clone(), GroupBy::None);
        assert_eq!(rows, LedgerRows::Timeline(ledger));
    }

    #[test]
    fn test_customer_buckets_in_first_seen_order() {
        let groups = buckets(group_ledger(sample_ledger(), GroupBy::Customer));
        let keys: Vec<&str> = groups.iter().map(|b| b.key.as_str()).collect();
        // "Zeta" is seen first, so it leads even though "Alpha" sorts before it.
        assert_eq!(keys, vec!["Zeta Haulage", "Alpha Stone"]);

        let zeta: Vec<(u8, i64)> = groups[0]
            .items
            .iter()
            .map(|t| (t.transaction_type_id, t.transaction_id))
            .collect();
        assert_eq!(zeta, vec![(1, 1), (2, 2), (1, 3)]);
    }

    #[test]
    fn test_date_buckets() {
        let groups = buckets(group_ledger(sample_ledger(), GroupBy::Date));
        let keys: Vec<&str> = groups.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[2].items.len(), 2);
    }

    #[test]
    fn test_type_buckets() {
        let groups = buckets(group_ledger(sample_ledger(), GroupBy::TransactionType));
        let keys: Vec<&str> = groups.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Order", "Payment"]);
        assert_eq!(groups[0].items.len(), 3);
        assert_eq!(groups[1].items.len(), 2);
    }

    #[test]
    fn test_bucket_items_sorted_even_from_unsorted_input() {
        let unsorted = vec![
            payment_tx(2, "Acme", at(2024, 1, 5, 0)),
            order_tx(8, "Acme", at(2024, 1, 5, 0)),
            order_tx(4, "Acme", at(2024, 1, 4, 0)),
        ];
        let groups = buckets(group_ledger(unsorted, GroupBy::Customer));
        assert_eq!(groups.len(), 1);
        let ids: Vec<i64> = groups[0].items.iter().map(|t| t.transaction_id).collect();
        assert_eq!(ids, vec![4, 8, 2]);
    }

    #[test]
    fn test_group_counts_preserved() {
        let rows = group_ledger(sample_ledger(), GroupBy::Customer);
        assert_eq!(rows.transaction_count(), 5);
    }
}
