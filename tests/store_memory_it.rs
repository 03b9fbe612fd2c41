// self
use token_rotor::{
	_preludet::*,
	store::{InsertOutcome, MemoryStore, RenameOutcome, TokenStore},
	token::{SessionId, TokenBinding, TokenId},
};

fn make_session(label: &str) -> SessionId {
	SessionId::new(label).expect("Session fixture should be valid.")
}

fn make_binding(session: &SessionId, expires_in: Duration) -> TokenBinding {
	TokenBinding::new(TokenId::generate(), session.clone(), OffsetDateTime::now_utc() + expires_in)
}

#[tokio::test]
async fn insert_then_find_active_round_trip() {
	let store = MemoryStore::default();
	let session = make_session("session-1");
	let binding = make_binding(&session, Duration::minutes(24));

	assert_eq!(
		store.insert(binding.clone()).await.expect("Insert should succeed."),
		InsertOutcome::Inserted
	);
	assert_eq!(
		store
			.find_active(&binding.token, OffsetDateTime::now_utc())
			.await
			.expect("Lookup should succeed."),
		Some(session)
	);
}

#[tokio::test]
async fn expired_rows_are_invisible_to_lookups_but_still_counted() {
	let store = MemoryStore::default();
	let session = make_session("session-1");
	let binding = make_binding(&session, Duration::seconds(-1));

	store.insert(binding.clone()).await.expect("Insert should succeed.");

	assert!(
		store
			.find_active(&binding.token, OffsetDateTime::now_utc())
			.await
			.expect("Lookup should succeed.")
			.is_none()
	);
	assert_eq!(store.len(), 1, "lookup gating must not delete; that is the sweeper's job");
	assert!(store.snapshot(&binding.token).is_some());
}

#[tokio::test]
async fn duplicate_insert_is_a_conflict_outcome() {
	let store = MemoryStore::default();
	let session = make_session("session-1");
	let binding = make_binding(&session, Duration::minutes(24));

	store.insert(binding.clone()).await.expect("First insert should succeed.");

	assert_eq!(
		store.insert(binding).await.expect("Conflict is an outcome, not an error."),
		InsertOutcome::IdConflict
	);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn failed_rename_leaves_the_old_row_untouched() {
	let store = MemoryStore::default();
	let session = make_session("session-1");
	let original = make_binding(&session, Duration::minutes(24));
	let occupant = make_binding(&session, Duration::minutes(24));

	store.insert(original.clone()).await.expect("Seeding the original should succeed.");
	store.insert(occupant.clone()).await.expect("Seeding the occupant should succeed.");

	// Renaming onto an occupied id conflicts and must not consume the old row.
	let collision =
		TokenBinding::new(occupant.token.clone(), session.clone(), original.expires_at);

	assert_eq!(
		store.rename(&original.token, collision).await.expect("Rename should report conflict."),
		RenameOutcome::IdConflict
	);
	assert!(store.snapshot(&original.token).is_some());

	// Renaming a nonexistent id is a lost race.
	let ghost = TokenId::generate();

	assert_eq!(
		store
			.rename(&ghost, make_binding(&session, Duration::minutes(24)))
			.await
			.expect("Rename should report the lost race."),
		RenameOutcome::LostRace
	);
	assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn ensure_schema_is_a_no_op() {
	let store = MemoryStore::default();

	store.ensure_schema().await.expect("Ensure-schema should succeed for the in-memory store.");
}
