pub mod amount;
pub mod crypto;
pub mod handler;
pub mod pool;
pub mod transaction;

use handler::TxHandler;
use pool::UtxoPool;
use transaction::Transaction;

pub use amount::Amount;
pub use crypto::Address;
pub use handler::RejectReason;

/// Apply a batch of transactions to `pool` and return the accepted transactions
/// together with the resulting pool
pub fn process_batch(
    pool: &UtxoPool,
    transactions: impl IntoIterator<Item = Transaction>,
) -> (Vec<Transaction>, UtxoPool) {
    let mut handler = TxHandler::new(pool);
    let accepted = handler.handle_txs(transactions);

    (accepted, handler.into_pool())
}
