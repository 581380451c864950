use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same wire strings as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(FeeStatus {
    Paid => "paid",
    Pending => "pending",
    NotRequired => "not_required",
});

str_enum!(VisitType {
    New => "new",
    Recheckup => "recheckup",
    Emergency => "emergency",
});

str_enum!(PaymentMode {
    Cash => "cash",
    Card => "card",
    Upi => "upi",
    Insurance => "insurance",
});

str_enum!(InventoryCategory {
    Injections => "injections",
    Surgical => "surgical",
});

impl FeeStatus {
    /// Human label used on printed documents.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::NotRequired => "Not Required",
        }
    }
}

impl VisitType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New Visit",
            Self::Recheckup => "Recheck-up",
            Self::Emergency => "Emergency",
        }
    }

    /// Recheck-up visits are exempt from consultation fees.
    pub fn default_fee_status(&self) -> FeeStatus {
        match self {
            Self::Recheckup => FeeStatus::NotRequired,
            Self::New | Self::Emergency => FeeStatus::Pending,
        }
    }
}

impl PaymentMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::Upi => "UPI",
            Self::Insurance => "Insurance",
        }
    }
}

impl InventoryCategory {
    pub const ALL: [InventoryCategory; 2] = [Self::Injections, Self::Surgical];
}
