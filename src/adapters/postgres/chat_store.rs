//! PostgreSQL implementation of ChatStore.
//!
//! Persists users, conversations, and messages via sqlx. The schema lives
//! in `migrations/`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::chat::{
    Conversation, ConversationContext, Message, MessageMetadata, MessageRole, User,
};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, UserRole};
use crate::ports::{
    ChatStore, ConversationSummary, ConversationWithHistory, Fetched, StoreError,
    RECENT_HISTORY_LIMIT,
};

/// PostgreSQL implementation of the ChatStore port.
#[derive(Clone)]
pub struct PostgresChatStore {
    pool: PgPool,
}

impl PostgresChatStore {
    /// Creates a new PostgresChatStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch user: {}", e)))?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, context, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch conversation: {}", e)))?;

        row.map(|row| conversation_from_row(&row)).transpose()
    }

    async fn recent_messages(&self, id: ConversationId) -> Result<Vec<Message>, StoreError> {
        // Newest window, then reversed into oldest-first order.
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(RECENT_HISTORY_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch messages: {}", e)))?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

#[async_trait]
impl ChatStore for PostgresChatStore {
    async fn ensure_user(
        &self,
        id: &UserId,
        default_role: UserRole,
    ) -> Result<Fetched<User>, StoreError> {
        if let Some(user) = self.find_user(id).await? {
            return Ok(Fetched::Found(user));
        }

        let user = User::demo(id.clone(), default_role);
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to insert user: {}", e)))?;

        Ok(Fetched::Created(user))
    }

    async fn get_or_create_conversation(
        &self,
        id: Option<ConversationId>,
        owner: &UserId,
        context: ConversationContext,
    ) -> Result<Fetched<ConversationWithHistory>, StoreError> {
        if let Some(id) = id {
            if let Some(conversation) = self.find_conversation(id).await? {
                let recent_messages = self.recent_messages(id).await?;
                return Ok(Fetched::Found(ConversationWithHistory {
                    conversation,
                    recent_messages,
                }));
            }
            // An unresolvable id falls through to creation.
        }

        let conversation = Conversation::new(owner.clone(), context);
        let context_json = serde_json::to_value(&conversation.context)
            .map_err(|e| StoreError::database(format!("Failed to encode context: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, context, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user_id.as_str())
        .bind(conversation.title.as_deref())
        .bind(context_json)
        .bind(conversation.created_at.as_datetime())
        .bind(conversation.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to insert conversation: {}", e)))?;

        Ok(Fetched::Created(ConversationWithHistory {
            conversation,
            recent_messages: Vec::new(),
        }))
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
        metadata: Option<MessageMetadata>,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: MessageId::new(),
            conversation_id,
            role,
            content: content.to_string(),
            metadata,
            created_at: Timestamp::now(),
        };

        let metadata_json = message
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::database(format!("Failed to encode metadata: {}", e)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(metadata_json)
        .bind(message.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::database(format!("Failed to insert message: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE conversations SET updated_at = $2 WHERE id = $1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(message.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::database(format!("Failed to touch conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::database(format!(
                "conversation {} not found",
                conversation_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(message)
    }

    async fn set_title_once(
        &self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<bool, StoreError> {
        // The title IS NULL guard makes the first write win.
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, updated_at = $3
            WHERE id = $1 AND title IS NULL
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(title)
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to set title: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.title, c.updated_at,
                   (SELECT m.content
                    FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC
                    LIMIT 1) AS last_message
            FROM conversations c
            WHERE c.user_id = $1
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to list conversations: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(ConversationSummary {
                    id: ConversationId::from_uuid(row.try_get("id").map_err(db_err)?),
                    title: row.try_get("title").map_err(db_err)?,
                    last_message: row.try_get("last_message").map_err(db_err)?,
                    updated_at: Timestamp::from_datetime(
                        row.try_get("updated_at").map_err(db_err)?,
                    ),
                })
            })
            .collect()
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::database(e.to_string())
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, StoreError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    let role: String = row.try_get("role").map_err(db_err)?;

    Ok(User {
        id: UserId::new(id).map_err(|e| StoreError::database(e.to_string()))?,
        email: row.try_get("email").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        role: role
            .parse()
            .map_err(|_| StoreError::database(format!("unknown role '{}' in users row", role)))?,
        created_at: Timestamp::from_datetime(row.try_get("created_at").map_err(db_err)?),
    })
}

fn conversation_from_row(row: &sqlx::postgres::PgRow) -> Result<Conversation, StoreError> {
    let user_id: String = row.try_get("user_id").map_err(db_err)?;
    let context: serde_json::Value = row.try_get("context").map_err(db_err)?;

    Ok(Conversation {
        id: ConversationId::from_uuid(row.try_get("id").map_err(db_err)?),
        user_id: UserId::new(user_id).map_err(|e| StoreError::database(e.to_string()))?,
        title: row.try_get("title").map_err(db_err)?,
        context: serde_json::from_value(context)
            .map_err(|e| StoreError::database(format!("Failed to decode context: {}", e)))?,
        created_at: Timestamp::from_datetime(row.try_get("created_at").map_err(db_err)?),
        updated_at: Timestamp::from_datetime(row.try_get("updated_at").map_err(db_err)?),
    })
}

fn message_from_row(row: &sqlx::postgres::PgRow) -> Result<Message, StoreError> {
    let role: String = row.try_get("role").map_err(db_err)?;
    let metadata: Option<serde_json::Value> = row.try_get("metadata").map_err(db_err)?;

    Ok(Message {
        id: MessageId::from_uuid(row.try_get("id").map_err(db_err)?),
        conversation_id: ConversationId::from_uuid(
            row.try_get("conversation_id").map_err(db_err)?,
        ),
        role: role.parse().map_err(|_| {
            StoreError::database(format!("unknown role '{}' in messages row", role))
        })?,
        content: row.try_get("content").map_err(db_err)?,
        metadata: metadata
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| StoreError::database(format!("Failed to decode metadata: {}", e)))?,
        created_at: Timestamp::from_datetime(row.try_get("created_at").map_err(db_err)?),
    })
}
