use serde::{Deserialize, Serialize};

/// A value transfer waiting in the pending list or sealed inside a block.
///
/// No field is validated: any sender, recipient or amount is accepted and
/// duplicates are allowed. Field order is part of the canonical block
/// encoding, so it must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    sender: String,
    recipient: String,
    amount: i64,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, amount: i64) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
        }
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient.as_str()
    }

    pub fn get_amount(&self) -> i64 {
        self.amount
    }
}
