use crate::{
    db_types::{Item, NewCustomer, NewOrder, NewTransaction, Order, Transaction},
    traits::StoreError,
};

/// The `CheckoutManagement` trait defines how a successful gateway charge is turned into persisted records.
///
/// Backends must guarantee that [`assemble_order`] is atomic: either the customer, transaction and order rows are all
/// written, or none of them are.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement {
    /// Fetches a catalogue item by id. Returns `None` if there is no such item.
    async fn fetch_item(&self, item_id: i64) -> Result<Option<Item>, StoreError>;

    /// Stores the customer, a cleared transaction and a cleared order referencing both, in a single atomic unit.
    /// Returns the new order.
    async fn assemble_order(
        &self,
        customer: NewCustomer,
        transaction: NewTransaction,
        order: NewOrder,
    ) -> Result<Order, StoreError>;

    /// Records a stand-alone cleared transaction with no customer or order attached.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;
}
