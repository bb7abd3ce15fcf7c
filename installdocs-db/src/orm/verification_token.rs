use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{EmailVerificationToken, NewEmailVerificationToken};
use crate::orm::{ensure_found, new_uuid};
use crate::validation::{MAX_TOKEN_LEN, require_text};

/// Issues a verification token for a user.
pub fn insert_verification_token(
    conn: &mut SqliteConnection,
    owner_id: &str,
    token_value: &str,
    expires: NaiveDateTime,
) -> DbResult<EmailVerificationToken> {
    use crate::schema::email_verification_tokens::dsl::*;

    require_text("token", token_value, MAX_TOKEN_LEN)?;

    let row = NewEmailVerificationToken {
        id: new_uuid(),
        user_id: owner_id.to_string(),
        token: token_value.to_string(),
        expires_at: expires,
    };

    let saved = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(email_verification_tokens)
            .values(&row)
            .execute(conn)?;
        Ok(email_verification_tokens
            .filter(id.eq(&row.id))
            .first::<EmailVerificationToken>(conn)?)
    })?;

    tracing::debug!(token_id = %saved.id, user_id = %saved.user_id, "issued verification token");
    Ok(saved)
}

pub fn get_verification_token(
    conn: &mut SqliteConnection,
    token_id: &str,
) -> DbResult<EmailVerificationToken> {
    use crate::schema::email_verification_tokens::dsl::*;
    Ok(email_verification_tokens
        .filter(id.eq(token_id))
        .first::<EmailVerificationToken>(conn)?)
}

pub fn get_verification_token_by_token(
    conn: &mut SqliteConnection,
    token_value: &str,
) -> DbResult<EmailVerificationToken> {
    use crate::schema::email_verification_tokens::dsl::*;
    Ok(email_verification_tokens
        .filter(token.eq(token_value))
        .first::<EmailVerificationToken>(conn)?)
}

/// Tokens issued to a user, newest first.
pub fn list_verification_tokens_for_user(
    conn: &mut SqliteConnection,
    owner_id: &str,
) -> DbResult<Vec<EmailVerificationToken>> {
    use crate::schema::email_verification_tokens::dsl::*;
    Ok(email_verification_tokens
        .filter(user_id.eq(owner_id))
        .order(created_at.desc())
        .load::<EmailVerificationToken>(conn)?)
}

pub fn delete_verification_token(conn: &mut SqliteConnection, token_id: &str) -> DbResult<()> {
    use crate::schema::email_verification_tokens::dsl::*;
    let affected = diesel::delete(email_verification_tokens.filter(id.eq(token_id))).execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

/// Deletes every token that expired at or before `now` and returns how many
/// were removed.
pub fn purge_expired_verification_tokens(
    conn: &mut SqliteConnection,
    now: NaiveDateTime,
) -> DbResult<usize> {
    use crate::schema::email_verification_tokens::dsl::*;
    let removed =
        diesel::delete(email_verification_tokens.filter(expires_at.le(now))).execute(conn)?;
    if removed > 0 {
        tracing::info!(removed, "purged expired verification tokens");
    }
    Ok(removed)
}
