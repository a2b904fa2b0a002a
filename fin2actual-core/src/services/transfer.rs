//! Transfer resolution
//!
//! A Financier transfer is two transactions pointing at each other through
//! `transfer`. Actual models the same thing as a payee: each account has a
//! transfer payee, and a transaction whose payee is that payee moves money
//! into that account. Resolution therefore finds the other leg, works out
//! which account it lives in and swaps in that account's transfer payee.

use std::collections::HashMap;

use crate::domain::result::{Error, Result};
use crate::domain::{DestinationPayee, Transaction};
use crate::services::resolver::IdMap;

#[derive(Debug, Clone)]
struct FlatEntry {
    id: String,
    /// The node's own account, or its top-level parent's for subtransactions
    owner_account: Option<String>,
}

/// Every transaction and subtransaction of the export, in one lookup table
///
/// Built once before references are rewritten and never mutated afterwards,
/// so account values are the provisional ids from the export.
#[derive(Debug, Default)]
pub struct FlattenedTransactions {
    entries: Vec<FlatEntry>,
    by_id: HashMap<String, Vec<usize>>,
}

impl FlattenedTransactions {
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut flat = Self::default();
        for tx in transactions {
            flat.push(tx, tx.account.as_deref());
        }
        flat
    }

    /// Subtransactions are pushed with their parent's account as owner
    fn push(&mut self, tx: &Transaction, owner_account: Option<&str>) {
        let index = self.entries.len();
        self.by_id.entry(tx.id.clone()).or_default().push(index);
        self.entries.push(FlatEntry {
            id: tx.id.clone(),
            owner_account: owner_account.map(str::to_string),
        });

        for sub in tx.splits() {
            self.push(sub, owner_account);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unique node with `id`
    fn counterpart(&self, id: &str) -> Result<&FlatEntry> {
        let matches = self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[]);
        match matches {
            [] => Err(Error::counterpart(format!(
                "transfer references {} but no such transaction exists",
                id
            ))),
            [index] => Ok(&self.entries[*index]),
            many => Err(Error::integrity(format!(
                "transfer counterpart {} is ambiguous: {} transactions share that id",
                id,
                many.len()
            ))),
        }
    }
}

/// Rewrites the payee of transfer legs to the destination's transfer payee
pub struct TransferResolver<'a> {
    flat: &'a FlattenedTransactions,
    ids: &'a IdMap,
    payees: &'a [DestinationPayee],
}

impl<'a> TransferResolver<'a> {
    pub fn new(flat: &'a FlattenedTransactions, ids: &'a IdMap, payees: &'a [DestinationPayee]) -> Self {
        Self { flat, ids, payees }
    }

    /// Transfer payee for the account holding the other leg of `reference`
    pub fn transfer_payee_for(&self, reference: &str) -> Result<&'a str> {
        let counterpart = self.flat.counterpart(reference)?;
        let account = counterpart.owner_account.as_deref().ok_or_else(|| {
            Error::integrity(format!(
                "transfer counterpart {} has no account",
                counterpart.id
            ))
        })?;

        // The snapshot normally holds provisional ids. A miss means the value
        // was already a destination id when the snapshot was taken.
        let account = self.ids.lookup(account).unwrap_or(account);

        self.payees
            .iter()
            .find(|p| p.is_transfer_payee_for(account))
            .map(|p| p.id.as_str())
            .ok_or_else(|| {
                Error::counterpart(format!(
                    "no transfer payee for account {} (counterpart of {})",
                    account, reference
                ))
            })
    }

    /// Resolve every transfer leg in a transaction tree.
    ///
    /// Returns the number of legs rewritten.
    pub fn resolve(&self, tx: &mut Transaction) -> Result<usize> {
        let owner = tx.account.clone();
        self.resolve_node(tx, owner.as_deref())
    }

    fn resolve_node(&self, tx: &mut Transaction, owner: Option<&str>) -> Result<usize> {
        let mut resolved = 0;

        if let Some(reference) = tx.transfer.as_deref() {
            if owner.is_none() {
                return Err(Error::integrity(format!(
                    "transfer leg {} belongs to no account",
                    tx.id
                )));
            }
            let payee = self.transfer_payee_for(reference)?;
            tx.payee = Some(payee.to_string());
            resolved += 1;
        }

        if let Some(subs) = tx.subtransactions.as_mut() {
            for sub in subs.iter_mut() {
                resolved += self.resolve_node(sub, owner)?;
            }
        }
        Ok(resolved)
    }
}
