//! The unit of pipeline work.

use async_trait::async_trait;

use pitchlens_shared::{RecordField, RecordUpdate, ResearchRecord, Result};

/// One step of the research pipeline.
///
/// A stage reads the record and returns a sparse [`RecordUpdate`]. It never
/// mutates the record itself; the engine merges the update after checking
/// it only touches the fields the stage declared in [`Stage::writes`].
///
/// Expected failures (collaborator errors, missing preconditions) belong in
/// the returned update. An `Err` is an unexpected stage-local failure that
/// the engine records before moving on.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Kebab-case name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Record fields the stage depends on. [`Pipeline::new`](crate::Pipeline::new)
    /// warns when no earlier stage writes one of them.
    fn reads(&self) -> &'static [RecordField];

    /// Record fields the stage may set.
    fn writes(&self) -> &'static [RecordField];

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate>;
}
