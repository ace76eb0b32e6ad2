//! Sort configuration and the controller that owns it

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::preferences::PreferenceStore;

/// Field the transaction list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Status,
    Title,
    Amount,
}

impl std::str::FromStr for SortField {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortField::Date),
            "status" => Ok(SortField::Status),
            "title" => Ok(SortField::Title),
            "amount" => Ok(SortField::Amount),
            _ => Err(CoreError::InvalidSort { value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Date => write!(f, "date"),
            SortField::Status => write!(f, "status"),
            SortField::Title => write!(f, "title"),
            SortField::Amount => write!(f, "amount"),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(CoreError::InvalidSort { value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Active sort configuration, always fully populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortConfig {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            order: SortOrder::Desc,
        }
    }
}

impl SortConfig {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Arrow shown next to a column header; blank for inactive columns
    pub fn indicator(&self, field: SortField) -> &'static str {
        if self.field != field {
            return " ";
        }
        match self.order {
            SortOrder::Desc => "↓",
            SortOrder::Asc => "↑",
        }
    }

    /// Human-readable label, e.g. "Date (Newest First)"
    pub fn label(&self) -> &'static str {
        match (self.field, self.order) {
            (SortField::Date, SortOrder::Desc) => "Date (Newest First)",
            (SortField::Date, SortOrder::Asc) => "Date (Oldest First)",
            (SortField::Status, SortOrder::Asc) => "Status (A-Z)",
            (SortField::Status, SortOrder::Desc) => "Status (Z-A)",
            (SortField::Title, SortOrder::Asc) => "Title (A-Z)",
            (SortField::Title, SortOrder::Desc) => "Title (Z-A)",
            (SortField::Amount, SortOrder::Desc) => "Amount (High to Low)",
            (SortField::Amount, SortOrder::Asc) => "Amount (Low to High)",
        }
    }

    /// Every selectable configuration in menu order
    pub fn options() -> Vec<SortConfig> {
        vec![
            SortConfig::new(SortField::Date, SortOrder::Desc),
            SortConfig::new(SortField::Date, SortOrder::Asc),
            SortConfig::new(SortField::Status, SortOrder::Asc),
            SortConfig::new(SortField::Status, SortOrder::Desc),
            SortConfig::new(SortField::Title, SortOrder::Asc),
            SortConfig::new(SortField::Title, SortOrder::Desc),
            SortConfig::new(SortField::Amount, SortOrder::Desc),
            SortConfig::new(SortField::Amount, SortOrder::Asc),
        ]
    }
}

/// Compact `field-order` form used by selection controls.
///
/// Names are lowercase only, matching the stored JSON form.
impl std::str::FromStr for SortConfig {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = s
            .split_once('-')
            .ok_or_else(|| CoreError::InvalidSort { value: s.to_string() })?;
        let field = field.parse::<SortField>().map_err(|_| CoreError::InvalidSort { value: s.to_string() })?;
        let order = order.parse::<SortOrder>().map_err(|_| CoreError::InvalidSort { value: s.to_string() })?;
        Ok(SortConfig { field, order })
    }
}

impl std::fmt::Display for SortConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.field, self.order)
    }
}

/// Owns the current [`SortConfig`] and keeps the preference store in sync.
pub struct SortController {
    current: SortConfig,
    store: Arc<dyn PreferenceStore>,
    key: String,
}

impl SortController {
    /// Restore the stored preference, falling back to the default on any problem
    pub fn load(store: Arc<dyn PreferenceStore>, key: &str) -> Self {
        let current = match store.get(key) {
            Some(raw) => match serde_json::from_str::<SortConfig>(&raw) {
                Ok(config) => config,
                Err(e) => {
                    log::debug!("Ignoring stored sort preference {:?}: {}", raw, e);
                    SortConfig::default()
                }
            },
            None => SortConfig::default(),
        };

        log::debug!("Sort preference loaded: {}", current);
        Self {
            current,
            store,
            key: key.to_string(),
        }
    }

    pub fn current(&self) -> SortConfig {
        self.current
    }

    /// Apply a sort selection.
    ///
    /// Without an explicit order, selecting the active field flips its order
    /// and selecting another field starts at `desc`.
    pub fn set_sort(&mut self, field: SortField, order: Option<SortOrder>) -> SortConfig {
        let order = match order {
            Some(order) => order,
            None if field == self.current.field => self.current.order.flipped(),
            None => SortOrder::Desc,
        };
        self.current = SortConfig { field, order };
        self.persist();
        self.current
    }

    /// Apply a compact `field-order` selection; invalid input leaves state untouched
    pub fn set_sort_str(&mut self, value: &str) -> CoreResult<SortConfig> {
        let config: SortConfig = value.parse()?;
        Ok(self.set_sort(config.field, Some(config.order)))
    }

    fn persist(&self) {
        let value = match serde_json::to_string(&self.current) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to serialize sort preference: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &value) {
            log::warn!("Failed to persist sort preference: {}", e);
        }
    }
}

impl std::fmt::Debug for SortController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortController")
            .field("current", &self.current)
            .field("key", &self.key)
            .finish()
    }
}
