//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked storage and messaging providers.

use crate::messenger::MockMessenger;
use crate::storage::MockObjectStore;

/// Create a mock store serving `catalog` for any fetch and signing every key.
///
/// Signed URLs look like `https://signed.test/{key}`.
#[must_use]
pub fn mock_store_with_catalog(catalog: &'static str) -> MockObjectStore {
    let mut mock = MockObjectStore::new();

    mock.expect_fetch_object()
        .returning(move |_| Ok(catalog.as_bytes().to_vec()));

    mock.expect_sign_get_url()
        .returning(|key, _| Ok(format!("https://signed.test/{key}")));

    mock
}

/// Create a mock messenger that accepts every send.
#[must_use]
pub fn mock_messenger_accepting() -> MockMessenger {
    let mut mock = MockMessenger::new();
    mock.expect_send_single_image().returning(|_, _| Ok(()));
    mock.expect_send_image_group().returning(|_, _| Ok(()));
    mock
}
