// Prompt templates for the two-step analysis -> extraction chain

use crate::schema::{
    CompanyRecord, CustomerSegment, GeographicScope, IndustryGroup, ProductServiceType, Sector,
    TradeStatus, EARLIEST_FOUNDING_YEAR,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Human-facing description of one `CompanyRecord` field, embedded in the analysis prompt.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
    pub example: Value,
}

fn labels<T: Copy>(all: &[T], label: fn(&T) -> &'static str) -> Value {
    Value::from(all.iter().map(label).collect::<Vec<_>>())
}

pub fn field_definitions(current_year: i32) -> Vec<FieldDefinition> {
    vec![
        FieldDefinition {
            name: "Sectors",
            description: "Same as GICS Sectors. A company may operate in one or more of these sectors.",
            field_type: "list",
            constraints: Some(labels(Sector::ALL, Sector::as_str)),
            example: json!(["Information Technology", "Health Care"]),
        },
        FieldDefinition {
            name: "IndustryGroups",
            description: "Same as GICS Industry Groups. A company may operate in one or more of these industry groups.",
            field_type: "list",
            constraints: Some(labels(IndustryGroup::ALL, IndustryGroup::as_str)),
            example: json!(["Software & Services", "Pharmaceuticals, Biotechnology & Life Sciences"]),
        },
        FieldDefinition {
            name: "Location",
            description: "The city where the company's headquarters is located. This should be the official registered location.",
            field_type: "string",
            constraints: None,
            example: json!("San Francisco"),
        },
        FieldDefinition {
            name: "GeographicScope",
            description: "Refers to the regions, countries, or areas where a company operates, offers its products or services, or has a market presence. Include only one of the provided categories.",
            field_type: "string",
            constraints: Some(labels(GeographicScope::ALL, GeographicScope::as_str)),
            example: json!("International"),
        },
        FieldDefinition {
            name: "YearFounded",
            description: "The year a company was established. It should be a valid year between 1800 and the current year.",
            field_type: "integer",
            constraints: Some(json!({"min": EARLIEST_FOUNDING_YEAR, "max": current_year})),
            example: json!(1998),
        },
        FieldDefinition {
            name: "Size",
            description: "Number of company's employees. This should be a positive integer.",
            field_type: "integer",
            constraints: Some(json!({"min": 1})),
            example: json!(5000),
        },
        FieldDefinition {
            name: "PublicPrivate",
            description: "Whether the company is publicly traded or privately held.",
            field_type: "string",
            constraints: Some(labels(TradeStatus::ALL, TradeStatus::as_str)),
            example: json!("Public"),
        },
        FieldDefinition {
            name: "ProductServiceType",
            description: "The type of product or service the company offers. This field specifies whether the company offers physical products, virtual services, or both.",
            field_type: "string",
            constraints: Some(labels(ProductServiceType::ALL, ProductServiceType::as_str)),
            example: json!("Both"),
        },
        FieldDefinition {
            name: "CustomerSegment",
            description: "List of customer bases that the company serves. A company can serve one or more of the following customer types: B2C (Business to Consumer), B2B (Business to Business), B2G (Business to Government), and C2C (Consumer to Consumer). In cases where a company serves multiple segments, include all applicable segments.",
            field_type: "list",
            constraints: Some(labels(CustomerSegment::ALL, CustomerSegment::as_str)),
            example: json!(["B2B", "B2G"]),
        },
        FieldDefinition {
            name: "Revenue",
            description: "Company's annual revenue in US dollars. The value must be positive and should not include currency symbols.",
            field_type: "float",
            constraints: Some(json!({"min": 0.0})),
            example: json!(50000000.0),
        },
        FieldDefinition {
            name: "Competitors",
            description: "A list of at least five competitor companies within the same industry or market. Each entry includes the competitor's name and revenue in US dollars. The list can have fewer than ten competitors if the company operates in a niche industry.",
            field_type: "dict",
            constraints: Some(json!({"min_items": 5})),
            example: json!({"Competitor1": 20000000.0, "Competitor2": 15000000.0}),
        },
        FieldDefinition {
            name: "MarketShares",
            description: "Top five product/service markets that the company is targeting (not geographic regions or countries) and its estimated market share in each market as a percentage range (e.g., '20-25%'). These are estimates and do not need to be exact values.",
            field_type: "dict",
            constraints: Some(json!({"min_items": 1})),
            example: json!({"Market1": "20-25%", "Market2": "15-20%"}),
        },
    ]
}

pub fn definitions_document(current_year: i32) -> Result<String, serde_json::Error> {
    serde_json::to_string(&json!({ "Company": field_definitions(current_year) }))
}

/// Format instructions derived from the `CompanyRecord` JSON Schema.
pub fn format_instructions() -> Result<String, serde_json::Error> {
    let schema = CompanyRecord::schema_as_json()?;
    Ok(format!(
        "The output should be formatted as a single JSON object that conforms to the JSON schema below. \
         Include every required property, use the property names exactly as written, and use only the \
         listed values for enumerated properties.\n\n\
         Here is the output schema:\n```json\n{}\n```",
        schema
    ))
}

/// A worked input/output pair shown to the model before the real query.
#[derive(Debug, Clone, PartialEq)]
pub struct FewShotExample {
    pub company: String,
    pub output: String,
}

pub fn default_examples() -> Vec<FewShotExample> {
    let output = json!({
        "Autodesk, Inc.": {
            "Sectors": ["Information Technology"],
            "IndustryGroups": ["Software & Services"],
            "Location": "San Rafael, California, USA",
            "GeographicScope": "Global",
            "YearFounded": 1982,
            "Size": 12600,
            "Revenue": 4386000000u64,
            "PublicPrivate": "Public",
            "ProductServiceType": "Both",
            "CustomerSegment": ["B2B", "B2C"],
            "Competitors": [
                "PTC",
                "Siemens Digital Industries Software",
                "Adobe",
                "Trimble",
                "Ansys",
                "Bentley Systems",
                "Hexagon AB",
                "Nemetschek",
                "Altair Engineering"
            ],
            "MarketShares": {
                "CAD software": "30-35%",
                "BIM software": "25-30%",
                "Engineering software": "15-20%",
                "3D modeling and animation software": "10-15%"
            }
        }
    });

    vec![FewShotExample {
        company: "Autodesk, Inc.".to_string(),
        output: output.to_string(),
    }]
}

pub fn analysis_prompt(company: &str, definitions: &str) -> String {
    format!(
        "There are some definitions within this JSON schema:\n{}\n\
         Make a comprehensive analysis of '{}' based on provided definitions. \
         Create a chain-of-thought to achieve the answer. \
         Break down each step into smaller steps (like explaining to an LLM agent how to gather a specific piece of data). \
         Then follow the steps and generate the answer.",
        definitions, company
    )
}

pub fn extraction_prompt(
    company: &str,
    format_instructions: &str,
    examples: &[FewShotExample],
) -> String {
    let mut prompt = format!(
        "Based on the analysis you've done, fit the results into a JSON object, \
         regarding the provided JSON schema and the examples.\n{}\n",
        format_instructions
    );
    for example in examples {
        prompt.push_str(&format!(
            "Company: {}\nOutput: {}\n",
            example.company, example.output
        ));
    }
    prompt.push_str(&format!("Company: {}\nOutput: ", company));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_every_record_field() {
        let definitions = field_definitions(2025);
        let names: Vec<&str> = definitions.iter().map(|d| d.name).collect();
        for field in [
            "Sectors",
            "IndustryGroups",
            "Location",
            "GeographicScope",
            "YearFounded",
            "Size",
            "PublicPrivate",
            "ProductServiceType",
            "CustomerSegment",
            "Revenue",
            "Competitors",
            "MarketShares",
        ] {
            assert!(names.contains(&field), "missing definition for {}", field);
        }
    }

    #[test]
    fn test_definitions_document_embeds_year_and_enums() {
        let document = definitions_document(2025).unwrap();
        assert!(document.contains("\"max\":2025"));
        assert!(document.contains("Semiconductors & Semiconductor Equipment"));
        assert!(document.contains("\"Local\",\"National\",\"International\",\"Global\""));
    }

    #[test]
    fn test_analysis_prompt_mentions_company() {
        let prompt = analysis_prompt("Acme Corp", "{}");
        assert!(prompt.starts_with("There are some definitions"));
        assert!(prompt.contains("'Acme Corp'"));
    }

    #[test]
    fn test_extraction_prompt_layout() {
        let examples = default_examples();
        let prompt = extraction_prompt("Acme Corp", "FORMAT", &examples);
        assert!(prompt.contains("FORMAT\n"));
        assert!(prompt.contains("Company: Autodesk, Inc.\nOutput: {"));
        assert!(prompt.ends_with("Company: Acme Corp\nOutput: "));

        let bare = extraction_prompt("Acme Corp", "FORMAT", &[]);
        assert!(!bare.contains("Autodesk"));
    }

    #[test]
    fn test_default_example_parses_as_record() {
        let example = &default_examples()[0];
        let record = crate::llm::parser::parse_company_record(&example.output, &example.company)
            .unwrap();
        assert_eq!(record.size, 12600);
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let instructions = format_instructions().unwrap();
        assert!(instructions.contains("```json"));
        assert!(instructions.contains("ProductServiceType"));
    }
}
