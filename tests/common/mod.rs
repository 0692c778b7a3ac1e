//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

use odata_core::metadata::{EdmType, InMemoryMetadata, ResourceProperty, ResourceType};

/// Customer / Address / Order catalog
pub fn catalog() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_type(
            ResourceType::entity("Customer")
                .with_key("CustomerID", EdmType::String)
                .with_property(ResourceProperty::primitive("Name", EdmType::String))
                .with_property(ResourceProperty::primitive("Age", EdmType::Int32))
                .with_property(ResourceProperty::primitive("Rating", EdmType::Double))
                .with_property(ResourceProperty::primitive("Since", EdmType::DateTime))
                .with_property(ResourceProperty::primitive("Token", EdmType::Guid))
                .with_property(ResourceProperty::complex("Address", "Address"))
                .with_property(ResourceProperty::navigation("BestFriend", "Customer"))
                .with_property(ResourceProperty::collection("Orders", "Order")),
        )
        .with_type(
            ResourceType::complex("Address")
                .with_property(ResourceProperty::primitive("City", EdmType::String))
                .with_property(ResourceProperty::primitive("Country", EdmType::String)),
        )
        .with_type(
            ResourceType::entity("Order")
                .with_key("OrderID", EdmType::Int32)
                .with_property(ResourceProperty::primitive("Total", EdmType::Decimal)),
        )
}

/// Twelve customers; ages repeat so key tiebreakers matter
pub fn customers() -> Vec<Value> {
    let rows: [(&str, &str, i32, Option<&str>); 12] = [
        ("ALFKI", "Alfreds", 34, Some("Germany")),
        ("ANATR", "Ana", 28, Some("Mexico")),
        ("ANTON", "Antonio", 34, Some("Mexico")),
        ("AROUT", "Around", 45, Some("UK")),
        ("BERGS", "Berglunds", 28, None),
        ("BLAUS", "Blauer", 51, Some("Germany")),
        ("BLONP", "Blondel", 34, Some("France")),
        ("BOLID", "Bolido", 19, Some("Spain")),
        ("BONAP", "Bon app'", 45, Some("France")),
        ("BOTTM", "Bottom-Dollar", 28, Some("Canada")),
        ("BSBEV", "B's Beverages", 62, Some("UK")),
        ("CACTU", "Cactus", 19, None),
    ];

    rows.iter()
        .map(|(id, name, age, country)| {
            let address = match country {
                Some(country) => json!({ "City": "Somewhere", "Country": country }),
                None => Value::Null,
            };
            json!({
                "CustomerID": id,
                "Name": name,
                "Age": age,
                "Address": address,
            })
        })
        .collect()
}

/// `customers()` plus addresses that are present but lack a country
pub fn customers_with_partial_addresses() -> Vec<Value> {
    let mut all = customers();
    all.push(json!({
        "CustomerID": "CHOPS",
        "Name": "Chop-suey",
        "Age": 28,
        "Address": { "City": "Bern", "Country": null },
    }));
    all.push(json!({
        "CustomerID": "COMMI",
        "Name": "Comercio",
        "Age": 45,
        "Address": { "City": "Sao Paulo" },
    }));
    all
}

pub fn ids(entities: &[Value]) -> Vec<String> {
    entities
        .iter()
        .map(|e| e["CustomerID"].as_str().unwrap_or_default().to_string())
        .collect()
}
