//! Persistent copy of the machine's cash inventory.

use crate::domain::DenominationCount;
use crate::error::RepoError;

#[async_trait::async_trait]
pub trait VaultStore: Send + Sync + 'static {
    /// The last saved note counts, or `None` if nothing was ever saved.
    async fn load_inventory(&self) -> Result<Option<DenominationCount>, RepoError>;

    /// Replaces the saved note counts as a whole.
    async fn save_inventory(&self, notes: &DenominationCount) -> Result<(), RepoError>;
}
