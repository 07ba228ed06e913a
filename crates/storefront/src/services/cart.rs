//! Cart persistence for signed-in shoppers.
//!
//! The session cart is mirrored into `profile.saved_cart` after every
//! mutation, and folded back into the session at the next login.

use sqlx::PgPool;

use emporium_core::{CartSnapshot, MergeReport, SessionCart, SnapshotError, UserId};

use crate::db::{ProfileRepository, RepositoryError};

/// What happened when a saved cart was folded into the session cart.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// No snapshot was stored.
    NothingSaved,
    /// The snapshot was merged.
    Merged(MergeReport),
    /// The snapshot was unreadable; the session cart was left alone.
    Rejected(SnapshotError),
}

/// Fold snapshot text into a session cart.
///
/// Pure counterpart of [`restore_saved_cart`].
pub fn merge_saved_cart(saved: Option<&str>, cart: &mut SessionCart) -> RestoreOutcome {
    let Some(text) = saved.filter(|t| !t.trim().is_empty()) else {
        return RestoreOutcome::NothingSaved;
    };

    match CartSnapshot::parse(text) {
        Ok(snapshot) => RestoreOutcome::Merged(cart.merge_snapshot(&snapshot)),
        Err(e) => RestoreOutcome::Rejected(e),
    }
}

/// Merge a user's saved cart into the session cart, then persist the result.
///
/// The merged cart replaces the stored snapshot, which drops malformed
/// entries and keeps items added while signed out. An unreadable snapshot is
/// logged and left in place.
///
/// # Errors
///
/// Returns `RepositoryError` if reading or writing the profile fails.
pub async fn restore_saved_cart(
    pool: &PgPool,
    user_id: UserId,
    cart: &mut SessionCart,
) -> Result<RestoreOutcome, RepositoryError> {
    let profiles = ProfileRepository::new(pool);
    let saved = profiles.saved_cart(user_id).await?;

    let outcome = merge_saved_cart(saved.as_deref(), cart);
    match &outcome {
        RestoreOutcome::NothingSaved => {
            if !cart.is_empty() {
                save_snapshot(pool, user_id, cart).await?;
            }
        }
        RestoreOutcome::Merged(report) => {
            if !report.skipped.is_empty() {
                tracing::warn!(
                    user_id = %user_id,
                    skipped = ?report.skipped,
                    "Skipped malformed saved cart entries"
                );
            }
            tracing::info!(
                user_id = %user_id,
                added = report.added,
                kept = report.kept,
                "Restored saved cart"
            );
            save_snapshot(pool, user_id, cart).await?;
        }
        RestoreOutcome::Rejected(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Ignoring unreadable saved cart");
        }
    }

    Ok(outcome)
}

/// Store the cart as the user's snapshot.
///
/// # Errors
///
/// Returns `RepositoryError` if the write fails.
pub async fn save_snapshot(
    pool: &PgPool,
    user_id: UserId,
    cart: &SessionCart,
) -> Result<(), RepositoryError> {
    let snapshot = CartSnapshot::encode(cart);
    ProfileRepository::new(pool)
        .set_saved_cart(user_id, Some(&snapshot))
        .await
}

/// Forget the user's snapshot (after a completed checkout).
///
/// # Errors
///
/// Returns `RepositoryError` if the write fails.
pub async fn clear_snapshot(pool: &PgPool, user_id: UserId) -> Result<(), RepositoryError> {
    ProfileRepository::new(pool)
        .set_saved_cart(user_id, None)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{ProductId, Quantity};

    use super::*;

    #[test]
    fn test_merge_saved_cart_into_empty_cart() {
        let mut cart = SessionCart::new();
        let outcome = merge_saved_cart(Some(r#"{"3": 2, "7": 1}"#), &mut cart);

        assert!(matches!(outcome, RestoreOutcome::Merged(ref r) if r.added == 2));
        assert_eq!(cart.quantity_of(ProductId::new(3)), Quantity::new(2));
        assert_eq!(cart.quantity_of(ProductId::new(7)), Quantity::new(1));
    }

    #[test]
    fn test_merge_saved_cart_nothing_saved() {
        let mut cart = SessionCart::new();
        assert!(matches!(
            merge_saved_cart(None, &mut cart),
            RestoreOutcome::NothingSaved
        ));
        assert!(matches!(
            merge_saved_cart(Some("   "), &mut cart),
            RestoreOutcome::NothingSaved
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_saved_cart_rejects_non_object_without_touching_cart() {
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(1), Quantity::ONE);
        let before = cart.clone();

        let outcome = merge_saved_cart(Some("[3, 2]"), &mut cart);

        assert!(matches!(outcome, RestoreOutcome::Rejected(_)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_merge_saved_cart_legacy_single_quoted_text_is_rejected() {
        let mut cart = SessionCart::new();
        let outcome = merge_saved_cart(Some("{'3': 2}"), &mut cart);
        assert!(matches!(outcome, RestoreOutcome::Rejected(SnapshotError::Json(_))));
        assert!(cart.is_empty());
    }
}
