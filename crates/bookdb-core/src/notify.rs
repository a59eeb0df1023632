//! Which order books a transaction touched.

use std::collections::HashSet;

use bookdb_types::{AcceptedTransaction, Book, LedgerEntryType};

/// Books touched by the offers a transaction created, modified or deleted.
///
/// Only successful transactions count. Order follows the metadata, with
/// repeats removed.
#[must_use]
pub fn affected_books(tx: &AcceptedTransaction) -> Vec<Book> {
    if !tx.is_success() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    tx.affected
        .iter()
        .filter(|node| node.entry_type == LedgerEntryType::Offer)
        .filter_map(|node| node.fields)
        .map(|fields| Book::new(fields.taker_pays, fields.taker_gets))
        .filter(|book| seen.insert(*book))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdb_types::{AccountId, AffectedNode, Issue, NodeAction, TxResult};

    fn usd_book() -> Book {
        Book::new(Issue::iou("USD", AccountId::random()), Issue::native())
    }

    #[test]
    fn collects_offer_books_in_order() {
        let a = usd_book();
        let b = a.reversed();
        let tx = AcceptedTransaction::touching(
            10,
            &[
                (NodeAction::Created, a),
                (NodeAction::Deleted, b),
                (NodeAction::Modified, a),
            ],
        );
        assert_eq!(affected_books(&tx), vec![a, b]);
    }

    #[test]
    fn failed_transaction_touches_nothing() {
        let mut tx = AcceptedTransaction::touching(10, &[(NodeAction::Created, usd_book())]);
        tx.result = TxResult::Failed("tecUNFUNDED_OFFER".into());
        assert!(affected_books(&tx).is_empty());
    }

    #[test]
    fn non_offer_nodes_ignored() {
        let mut tx = AcceptedTransaction::touching(10, &[]);
        tx.affected.push(AffectedNode {
            action: NodeAction::Modified,
            entry_type: LedgerEntryType::AccountRoot,
            fields: None,
        });
        tx.affected.push(AffectedNode {
            action: NodeAction::Modified,
            entry_type: LedgerEntryType::Offer,
            fields: None,
        });
        assert!(affected_books(&tx).is_empty());
    }
}
