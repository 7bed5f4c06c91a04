use crate::schema::Transaction;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Total ledger order: date, then type priority, then source id.
pub fn ledger_order(a: &Transaction, b: &Transaction) -> Ordering {
    a.transaction_date
        .cmp(&b.transaction_date)
        .then(a.transaction_type_id.cmp(&b.transaction_type_id))
        .then(a.transaction_id.cmp(&b.transaction_id))
}

pub fn sort_ledger(transactions: &mut [Transaction]) {
    transactions.sort_by(ledger_order);
}

/// Concatenates two normalized streams and sorts the result into ledger order.
pub fn merge_ledger(first: Vec<Transaction>, second: Vec<Transaction>) -> Vec<Transaction> {
    let mut ledger = first;
    ledger.extend(second);
    sort_ledger(&mut ledger);
    ledger
}

struct HeapEntry {
    transaction: Transaction,
    stream: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        ledger_order(&self.transaction, &other.transaction).then(self.stream.cmp(&other.stream))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// K-way merge over any number of streams. Produces exactly the order of
/// [`merge_ledger`] on the concatenation, without sorting the whole ledger at once.
pub fn merge_sorted(streams: Vec<Vec<Transaction>>) -> Vec<Transaction> {
    let total = streams.iter().map(Vec::len).sum();

    // Readers only promise date order; equal dates inside a stream still need the tie-break.
    let mut cursors: Vec<_> = streams
        .into_iter()
        .map(|mut stream| {
            sort_ledger(&mut stream);
            stream.into_iter()
        })
        .collect();

    let mut heap = BinaryHeap::with_capacity(cursors.len());
    for (stream, cursor) in cursors.iter_mut().enumerate() {
        if let Some(transaction) = cursor.next() {
            heap.push(Reverse(HeapEntry {
                transaction,
                stream,
            }));
        }
    }

    let mut merged = Vec::with_capacity(total);
    while let Some(Reverse(entry)) = heap.pop() {
        let stream = entry.stream;
        merged.push(entry.transaction);
        if let Some(transaction) = cursors[stream].next() {
            heap.push(Reverse(HeapEntry {
                transaction,
                stream,
            }));
        }
    }
    merged
}
