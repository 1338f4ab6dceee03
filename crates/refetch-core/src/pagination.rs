// ── Pagination state ──
//
// Page position and total tracking for paginated mode, plus the wire
// field names paginated endpoints use.

use serde::{Deserialize, Serialize};

use crate::params::Params;

/// Parameter field carrying the requested page number.
pub(crate) const PAGE_NO_FIELD: &str = "pageNo";
/// Parameter field carrying the requested page size.
pub(crate) const PAGE_SIZE_FIELD: &str = "pageSize";
/// Response field nesting the page of results.
pub(crate) const RESULT_FIELD: &str = "result";
/// Response field carrying the total row count.
pub(crate) const TOTAL_FIELD: &str = "total";

/// Current page position and total, observable through the controller's
/// `pagination()` subscription.
///
/// `page_no`/`page_size` reflect the parameters of the last paginated
/// run; `total` reflects the last response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_no: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page_no: 1,
            page_size: 10,
            total: 0,
        }
    }
}

impl PageInfo {
    /// The paging fields as request parameters.
    pub(crate) fn params(&self) -> Params {
        Params::new()
            .with(PAGE_NO_FIELD, self.page_no)
            .with(PAGE_SIZE_FIELD, self.page_size)
    }
}
