use sqlx::SqliteConnection;

use crate::{db_types::Item, traits::StoreError};

pub async fn fetch_item(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<Item>, StoreError> {
    let item = sqlx::query_as::<_, Item>(
        r#"
            SELECT id, name, description, inventory_level, price, COALESCE(image, '') as image, is_recurring,
                   plan_id, created_at, updated_at
            FROM items
            WHERE id = $1
        "#,
    )
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}
