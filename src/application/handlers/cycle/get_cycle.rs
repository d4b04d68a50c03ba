//! GetCycleHandler - Query handler for retrieving a cycle with its phases
//! and currently assigned items.

use std::sync::Arc;

use crate::domain::cycle::CycleError;
use crate::domain::foundation::{CommandMetadata, CycleId};
use crate::ports::{CycleRepository, ItemStateGateway, PhaseRepository};

use super::summary::{CycleSummary, CycleView};

const OPERATION: &str = "get_cycle";

/// Query to get a cycle by ID.
#[derive(Debug, Clone)]
pub struct GetCycleQuery {
    pub cycle_id: CycleId,
}

/// Handler for retrieving cycle details.
///
/// Lookups are scoped to the caller's facility; a cycle in another facility
/// is reported as not found.
pub struct GetCycleHandler {
    cycles: Arc<dyn CycleRepository>,
    phases: Arc<dyn PhaseRepository>,
    items: Arc<dyn ItemStateGateway>,
}

impl GetCycleHandler {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        phases: Arc<dyn PhaseRepository>,
        items: Arc<dyn ItemStateGateway>,
    ) -> Self {
        Self {
            cycles,
            phases,
            items,
        }
    }

    pub async fn handle(
        &self,
        query: GetCycleQuery,
        metadata: CommandMetadata,
    ) -> Result<CycleView, CycleError> {
        let identity = metadata.identity()?;
        let port_err = |e| CycleError::from_port(OPERATION, e);

        let cycle = self
            .cycles
            .find_by_id(&identity.facility_id, &query.cycle_id)
            .await
            .map_err(port_err)?
            .ok_or_else(|| {
                CycleError::not_found(format!("Cycle not found: {}", query.cycle_id))
            })?;
        let phases = self
            .phases
            .find_by_cycle(&query.cycle_id)
            .await
            .map_err(port_err)?;
        let items = self
            .items
            .list_by_cycle(&query.cycle_id)
            .await
            .map_err(port_err)?;

        Ok(CycleView {
            summary: CycleSummary::new(&cycle, &phases, items.len()),
            items,
        })
    }
}
