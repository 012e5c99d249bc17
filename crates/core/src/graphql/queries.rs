//! GraphQL operation definitions for the catalog backend.
//!
//! Each operation gets a module holding its document, `Variables` and
//! `ResponseData`, plus a marker struct implementing
//! [`graphql_client::GraphQLQuery`] so clients can stay generic over the
//! operation they execute.

use graphql_client::{GraphQLQuery, QueryBody};

/// Fields selected for every product, spliced into each document.
macro_rules! product_fields {
    () => {
        r"
fragment ProductFields on Product {
  id
  name
  description
  genre
  status
  imageUrl
  imagePublicId
  createdAt
  variants {
    talla
    stock
    price
  }
}"
    };
}

/// Implement `GraphQLQuery` for an operation marker.
macro_rules! operation {
    ($marker:ident, $module:ident) => {
        pub struct $marker;

        impl GraphQLQuery for $marker {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// Product queries
operation!(GetProducts, get_products);
operation!(GetProduct, get_product);

// Product mutations
operation!(CreateProduct, create_product);
operation!(UpdateProduct, update_product);
operation!(UpdateProductStatus, update_product_status);

pub mod get_products {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Serialize};

    use crate::graphql::ProductNode;

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = concat!(
        r"
query GetProducts($filter: ProductFilterInput, $page: Int!, $limit: Int!) {
  products(filter: $filter, page: $page, limit: $limit) {
    items {
      ...ProductFields
    }
    total
    page
    limit
  }
}",
        product_fields!()
    );

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductFilterInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
        #[serde(
            skip_serializing_if = "Option::is_none",
            with = "rust_decimal::serde::float_option"
        )]
        pub min_price: Option<Decimal>,
        #[serde(
            skip_serializing_if = "Option::is_none",
            with = "rust_decimal::serde::float_option"
        )]
        pub max_price: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub genre: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub talla: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<String>,
    }

    impl ProductFilterInput {
        #[must_use]
        pub fn is_empty(&self) -> bool {
            *self == Self::default()
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct Variables {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub filter: Option<ProductFilterInput>,
        pub page: i64,
        pub limit: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: ProductsPage,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductsPage {
        pub items: Vec<ProductNode>,
        pub total: i64,
        pub page: i64,
        pub limit: i64,
    }
}

pub mod get_product {
    use serde::{Deserialize, Serialize};

    use crate::graphql::ProductNode;

    pub const OPERATION_NAME: &str = "GetProduct";
    pub const QUERY: &str = concat!(
        r"
query GetProduct($id: ID!) {
  product(id: $id) {
    ...ProductFields
  }
}",
        product_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }
}

pub mod create_product {
    use serde::{Deserialize, Serialize};

    use crate::graphql::{ProductInput, ProductNode};

    pub const OPERATION_NAME: &str = "CreateProduct";
    pub const QUERY: &str = concat!(
        r"
mutation CreateProduct($input: CreateProductInput!) {
  createProduct(input: $input) {
    ...ProductFields
  }
}",
        product_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: ProductInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub create_product: ProductNode,
    }
}

pub mod update_product {
    use serde::{Deserialize, Serialize};

    use crate::graphql::{ProductInput, ProductNode};

    pub const OPERATION_NAME: &str = "UpdateProduct";
    pub const QUERY: &str = concat!(
        r"
mutation UpdateProduct($id: ID!, $input: UpdateProductInput!) {
  updateProduct(id: $id, input: $input) {
    ...ProductFields
  }
}",
        product_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub input: ProductInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub update_product: Option<ProductNode>,
    }
}

pub mod update_product_status {
    use serde::{Deserialize, Serialize};

    use crate::graphql::ProductNode;

    pub const OPERATION_NAME: &str = "UpdateProductStatus";
    pub const QUERY: &str = concat!(
        r"
mutation UpdateProductStatus($id: ID!, $status: ProductStatus!) {
  updateProductStatus(id: $id, status: $status) {
    ...ProductFields
  }
}",
        product_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
        pub status: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub update_product_status: Option<ProductNode>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_include_fragment() {
        for query in [
            get_products::QUERY,
            get_product::QUERY,
            create_product::QUERY,
            update_product::QUERY,
            update_product_status::QUERY,
        ] {
            assert!(query.contains("...ProductFields"));
            assert!(query.contains("fragment ProductFields on Product"));
        }
    }

    #[test]
    fn test_build_query_sets_operation_name() {
        let body = GetProduct::build_query(get_product::Variables {
            id: "p1".to_string(),
        });
        assert_eq!(body.operation_name, "GetProduct");
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["variables"]["id"], "p1");
        assert_eq!(json["operationName"], "GetProduct");
    }
}
