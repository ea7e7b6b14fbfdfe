use crate::error::{EnrichError, Result};
use chrono::Datelike;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const EARLIEST_FOUNDING_YEAR: i32 = 1800;

/// Declares a closed categorical field whose wire form is its display label.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            JsonSchema,
        )]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum! {
    /// GICS sector.
    pub enum Sector {
        Energy => "Energy",
        Materials => "Materials",
        Industrials => "Industrials",
        ConsumerDiscretionary => "Consumer Discretionary",
        ConsumerStaples => "Consumer Staples",
        HealthCare => "Health Care",
        Financials => "Financials",
        InformationTechnology => "Information Technology",
        CommunicationServices => "Communication Services",
        Utilities => "Utilities",
        RealEstate => "Real Estate",
    }
}

labelled_enum! {
    /// GICS industry group.
    pub enum IndustryGroup {
        Energy => "Energy",
        Materials => "Materials",
        CapitalGoods => "Capital Goods",
        CommercialProfessionalServices => "Commercial & Professional Services",
        Transportation => "Transportation",
        AutomobilesComponents => "Automobiles & Components",
        ConsumerDurablesApparel => "Consumer Durables & Apparel",
        ConsumerServices => "Consumer Services",
        Retailing => "Retailing",
        FoodStaplesRetailing => "Food & Staples Retailing",
        FoodBeverageTobacco => "Food, Beverage & Tobacco",
        HouseholdPersonalProducts => "Household & Personal Products",
        HealthCareEquipmentServices => "Health Care Equipment & Services",
        PharmaceuticalsBiotechLifeSciences => "Pharmaceuticals, Biotechnology & Life Sciences",
        Banks => "Banks",
        DiversifiedFinancials => "Diversified Financials",
        Insurance => "Insurance",
        SoftwareServices => "Software & Services",
        TechnologyHardwareEquipment => "Technology Hardware & Equipment",
        SemiconductorsEquipment => "Semiconductors & Semiconductor Equipment",
        TelecommunicationServices => "Telecommunication Services",
        MediaEntertainment => "Media & Entertainment",
        Utilities => "Utilities",
        RealEstate => "Real Estate",
    }
}

labelled_enum! {
    pub enum GeographicScope {
        Local => "Local",
        National => "National",
        International => "International",
        Global => "Global",
    }
}

labelled_enum! {
    pub enum TradeStatus {
        Public => "Public",
        Private => "Private",
    }
}

labelled_enum! {
    pub enum ProductServiceType {
        Physical => "Physical",
        Virtual => "Virtual",
        Both => "Both",
    }
}

labelled_enum! {
    pub enum CustomerSegment {
        B2C => "B2C",
        B2B => "B2B",
        B2G => "B2G",
        C2C => "C2C",
    }
}

/// Competitors are either a ranked list of names or a name → annual revenue (USD) map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Competitors {
    Names(Vec<String>),
    WithRevenue(
        #[serde(deserialize_with = "coerce::float_map")] BTreeMap<String, f64>,
    ),
}

impl Competitors {
    pub fn len(&self) -> usize {
        match self {
            Competitors::Names(names) => names.len(),
            Competitors::WithRevenue(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyRecord {
    #[schemars(
        description = "All GICS Sectors that the company is active at. A company may operate in one or more of these sectors."
    )]
    pub sectors: BTreeSet<Sector>,

    #[schemars(
        description = "The GICS Industry Groups that the company is active at. A company may operate in one or more of these industry groups."
    )]
    pub industry_groups: BTreeSet<IndustryGroup>,

    #[schemars(
        description = "The city where the company's headquarters is located. This should be the official registered location."
    )]
    pub location: String,

    #[schemars(
        description = "Refers to the regions, countries, or areas where a company operates, offers its products or services, or has a market presence. Include only one of the provided categories."
    )]
    pub geographic_scope: GeographicScope,

    #[serde(deserialize_with = "coerce::integer")]
    #[schemars(
        with = "i32",
        description = "The year a company was established. It should be a valid year between 1800 and the current year."
    )]
    pub year_founded: i32,

    #[serde(deserialize_with = "coerce::integer")]
    #[schemars(
        with = "u64",
        description = "Number of company's employees. This should be a positive integer."
    )]
    pub size: u64,

    #[schemars(description = "Whether the company is publicly traded or privately held.")]
    pub public_private: TradeStatus,

    #[schemars(
        description = "The type of product or service the company offers. This field specifies whether the company offers physical products, virtual services, or both."
    )]
    pub product_service_type: ProductServiceType,

    #[schemars(
        description = "List of customer bases that the company serves. A company can serve one or more of the following customer types: B2C (Business to Consumer), B2B (Business to Business), B2G (Business to Government), and C2C (Consumer to Consumer). In cases where a company serves multiple segments, include all applicable segments."
    )]
    pub customer_segment: BTreeSet<CustomerSegment>,

    #[serde(deserialize_with = "coerce::float")]
    #[schemars(
        with = "f64",
        description = "Company's annual revenue in US dollars. The value must be positive and should not include currency symbols."
    )]
    pub revenue: f64,

    #[schemars(
        description = "At least five competitor companies within the same industry or market, either as a list of names or as a map from competitor name to its annual revenue in US dollars. Fewer are acceptable for niche industries."
    )]
    pub competitors: Competitors,

    #[schemars(
        description = "Top five product/service markets that the company is targeting (not geographic regions or countries) and its estimated market share in each market as a percentage range (e.g., '20-25%'). These are estimates and do not need to be exact values."
    )]
    pub market_shares: BTreeMap<String, String>,
}

impl CompanyRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CompanyRecord)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Checks the range constraints serde cannot express, against today's calendar year.
    pub fn validate(&self) -> Result<()> {
        self.validate_for_year(chrono::Utc::now().year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<()> {
        let mut violations = Vec::new();

        if self.sectors.is_empty() {
            violations.push("Sectors must list at least one sector".to_string());
        }
        if !(EARLIEST_FOUNDING_YEAR..=current_year).contains(&self.year_founded) {
            violations.push(format!(
                "YearFounded {} is outside {}..={}",
                self.year_founded, EARLIEST_FOUNDING_YEAR, current_year
            ));
        }
        if self.size == 0 {
            violations.push("Size must be a positive employee count".to_string());
        }
        if !self.revenue.is_finite() || self.revenue < 0.0 {
            violations.push(format!(
                "Revenue {} must be a non-negative USD amount",
                self.revenue
            ));
        }
        if let Competitors::WithRevenue(map) = &self.competitors {
            for (name, revenue) in map {
                if !revenue.is_finite() || *revenue < 0.0 {
                    violations.push(format!(
                        "Competitor '{}' revenue {} must be a non-negative USD amount",
                        name, revenue
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EnrichError::Validation(violations.join("; ")))
        }
    }
}

/// Lenient numeric decoding: a JSON number, or a string holding one.
mod coerce {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(serde_json::Number),
        Text(String),
    }

    fn to_f64<E: Error>(value: NumberOrText) -> Result<f64, E> {
        match value {
            NumberOrText::Number(n) => n
                .as_f64()
                .ok_or_else(|| E::custom(format!("{} is not representable as a float", n))),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("expected a number, found \"{}\"", s))),
        }
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        to_f64(NumberOrText::deserialize(deserializer)?)
    }

    pub fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let wide = match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => match n.as_i64() {
                Some(v) => v,
                None => whole(to_f64(NumberOrText::Number(n))?)?,
            },
            NumberOrText::Text(s) => match s.trim().parse::<i64>() {
                Ok(v) => v,
                Err(_) => whole(to_f64(NumberOrText::Text(s))?)?,
            },
        };
        T::try_from(wide).map_err(|_| D::Error::custom(format!("{} is out of range", wide)))
    }

    fn whole<E: Error>(value: f64) -> Result<i64, E> {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(value as i64)
        } else {
            Err(E::custom(format!("expected an integer, found {}", value)))
        }
    }

    pub fn float_map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, f64>, D::Error> {
        BTreeMap::<String, NumberOrText>::deserialize(deserializer)?
            .into_iter()
            .map(|(name, value)| Ok((name, to_f64(value)?)))
            .collect()
    }
}
