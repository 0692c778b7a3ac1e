//! Sample catalog shared by unit tests

use super::{EdmType, InMemoryMetadata, ResourceProperty, ResourceType};

/// Customer/Address/Order catalog
pub(crate) fn northwind() -> InMemoryMetadata {
    let customer = ResourceType::entity("Customer")
        .with_key("CustomerID", EdmType::String)
        .with_property(ResourceProperty::primitive("Name", EdmType::String))
        .with_property(ResourceProperty::primitive("Age", EdmType::Int32))
        .with_property(ResourceProperty::primitive("Rating", EdmType::Double))
        .with_property(ResourceProperty::primitive("Balance", EdmType::Decimal))
        .with_property(ResourceProperty::primitive("Token", EdmType::Guid))
        .with_property(ResourceProperty::primitive("Photo", EdmType::Binary))
        .with_property(ResourceProperty::primitive("Since", EdmType::DateTime))
        .with_property(ResourceProperty::primitive("IsActive", EdmType::Boolean))
        .with_property(ResourceProperty::complex("Address", "Address"))
        .with_property(ResourceProperty::navigation("BestFriend", "Customer"))
        .with_property(ResourceProperty::collection("Orders", "Order"));

    let address = ResourceType::complex("Address")
        .with_property(ResourceProperty::primitive("Street", EdmType::String))
        .with_property(ResourceProperty::primitive("City", EdmType::String))
        .with_property(ResourceProperty::primitive("Country", EdmType::String))
        .with_property(ResourceProperty::primitive("Verified", EdmType::Boolean));

    let order = ResourceType::entity("Order")
        .with_key("OrderID", EdmType::Int32)
        .with_property(ResourceProperty::primitive("Total", EdmType::Decimal))
        .with_property(ResourceProperty::primitive("ShippedOn", EdmType::DateTime))
        .with_property(ResourceProperty::navigation("Customer", "Customer"));

    InMemoryMetadata::new()
        .with_type(customer)
        .with_type(address)
        .with_type(order)
}
