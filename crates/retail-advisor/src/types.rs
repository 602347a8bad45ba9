use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The three retail domains a question can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    DemandForecasting,
    InventoryMonitoring,
    PriceOptimization,
}

impl Domain {
    /// Dispatch order. Responses are always concatenated in this order.
    pub const ALL: [Domain; 3] = [
        Domain::DemandForecasting,
        Domain::InventoryMonitoring,
        Domain::PriceOptimization,
    ];

    /// Marker that opens this domain's section in a raw workflow response.
    pub fn response_header(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "📊 Demand Forecasting Response:",
            Self::InventoryMonitoring => "📦 Inventory Monitoring Response:",
            Self::PriceOptimization => "💰 Pricing Optimization Response:",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "📊",
            Self::InventoryMonitoring => "📦",
            Self::PriceOptimization => "💰",
        }
    }

    pub fn display_title(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "📊 Demand Forecasting",
            Self::InventoryMonitoring => "📦 Inventory Monitoring",
            Self::PriceOptimization => "💰 Price Optimization",
        }
    }

    /// Lowercase category name the supervisor model is asked to output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "demand forecasting",
            Self::InventoryMonitoring => "inventory monitoring",
            Self::PriceOptimization => "price optimization",
        }
    }

    pub fn dataset_file(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "demand_forecasting.csv",
            Self::InventoryMonitoring => "inventory_monitoring.csv",
            Self::PriceOptimization => "pricing_optimization.csv",
        }
    }

    pub fn index_dir(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "demand_index",
            Self::InventoryMonitoring => "inventory_index",
            Self::PriceOptimization => "pricing_index",
        }
    }

    /// Input prompt for the single-responder REPL.
    pub fn standalone_prompt(&self) -> &'static str {
        match self {
            Self::DemandForecasting => "Ask a question about demand forecasting: ",
            Self::InventoryMonitoring => "Ask about inventory monitoring: ",
            Self::PriceOptimization => "Ask about pricing strategy: ",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DemandForecasting => "demand",
            Self::InventoryMonitoring => "inventory",
            Self::PriceOptimization => "pricing",
        };
        f.write_str(name)
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demand" | "demand_forecasting" | "demand-forecasting" => Ok(Self::DemandForecasting),
            "inventory" | "inventory_monitoring" | "inventory-monitoring" => {
                Ok(Self::InventoryMonitoring)
            }
            "pricing" | "price" | "price_optimization" | "price-optimization" => {
                Ok(Self::PriceOptimization)
            }
            other => Err(format!(
                "unknown domain '{}' (expected demand, inventory or pricing)",
                other
            )),
        }
    }
}

/// One CSV data row rendered as `header: value` lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvDocument {
    pub text: String,
    pub source: String,
    pub row: usize,
}

impl CsvDocument {
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), self.source.clone());
        metadata.insert("row".to_string(), self.row.to_string());
        metadata
    }
}

/// Internal chunk record for storage operations
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub doc_id: String,
    pub chunk_index: u32,
    pub text: String,
    pub source: String,
    pub row: u32,
    pub vector: Vec<f32>,
    pub metadata_json: String,
    pub created_at: i64,
}
