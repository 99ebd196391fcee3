//! Resource-status publication and stock-inclusive balance queries.
//!
//! After each allocation pass the scheduler publishes one
//! [`ResourceStatus`] per known resource. Buildings and other holders that
//! keep their own stockpiles are not part of the ledger; [`total_balance`]
//! sums them on top of the ledger's balance for dashboards and UI.

use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, ResourceInfo};
use crate::resource::ResourceName;

/// Published counters for one resource after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Resource name.
    pub name: ResourceName,
    /// Installed capacity.
    pub production: i64,
    /// Balance left after every producer was processed.
    pub available: i64,
    /// Amount taken this tick.
    pub consumption: i64,
}

impl ResourceStatus {
    /// Build a status entry from ledger counters.
    #[must_use]
    pub fn new(name: ResourceName, info: ResourceInfo) -> Self {
        Self {
            name,
            production: info.production,
            available: info.available,
            consumption: info.consumption,
        }
    }

    /// Fraction of capacity consumed, in whole percent. Zero capacity reads 0.
    #[must_use]
    pub fn utilization_percent(&self) -> i64 {
        if self.production <= 0 {
            return 0;
        }
        let percent = i128::from(self.consumption) * 100 / i128::from(self.production);
        i64::try_from(percent).unwrap_or(i64::MAX)
    }
}

/// Anything that holds stock of a resource outside the ledger.
pub trait StockHolder {
    /// Amount of `resource` this holder currently stores.
    fn stock(&self, resource: &ResourceName) -> i64;
}

impl<T: StockHolder + ?Sized> StockHolder for &T {
    fn stock(&self, resource: &ResourceName) -> i64 {
        (**self).stock(resource)
    }
}

/// Current balance of `resource` including stock held outside the ledger.
///
/// Read-only: neither the ledger nor the holders are modified.
pub fn total_balance<H, I>(ledger: &Ledger, resource: &ResourceName, holders: I) -> i64
where
    H: StockHolder,
    I: IntoIterator<Item = H>,
{
    holders
        .into_iter()
        .fold(ledger.available(resource.as_str()), |total, holder| {
            total.saturating_add(holder.stock(resource))
        })
}
