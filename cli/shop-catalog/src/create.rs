//! Product creation across the backend's two execution modes.
//!
//! A submission either returns the created product right away, or a handle
//! to a background operation that is polled until it reaches a terminal
//! state, the time budget runs out, or the caller cancels.

use serde_json::json;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api_types::{
    FileSetInput,
    InventoryItemSetInput,
    InventoryQuantitySetInput,
    NameInput,
    OptionSetInput,
    ProductOperationData,
    ProductSetData,
    ProductSetInput,
    ProductSetPayload,
    RawOperation,
    VariantOptionValueSetInput,
    VariantSetInput,
};
use crate::config::CreationPolicy;
use crate::documents;
use crate::error::{CatalogError, fmt_user_errors};
use crate::ids::{ResourceKind, ensure_resource_id, to_local};
use crate::transport::Transport;
use crate::types::{CreateRequest, FileInput, OperationStatus, VariantInput};

/// Requests with at most this many variants ask for synchronous execution.
pub const SYNCHRONOUS_VARIANT_LIMIT: usize = 10;

/// Inventory state that submitted quantities are recorded under.
const AVAILABLE_QUANTITY: &str = "available";

/// The two shapes a submission can come back in.
#[derive(Debug, Clone, PartialEq)]
pub enum CreationOutcome {
    /// The product was created while handling the submission.
    Immediate(String),
    /// Creation continues in the background.
    Operation {
        id: String,
        status: OperationStatus,
        product_id: Option<String>,
    },
}

impl TryFrom<ProductSetPayload> for CreationOutcome {
    type Error = CatalogError;

    fn try_from(payload: ProductSetPayload) -> Result<Self, Self::Error> {
        if !payload.user_errors.is_empty() {
            return Err(CatalogError::CreationRejected(fmt_user_errors(
                &payload.user_errors,
            )));
        }

        match (payload.product, payload.product_set_operation) {
            (Some(product), None) => Ok(CreationOutcome::Immediate(product.id)),
            (None, Some(operation)) => {
                if !operation.user_errors.is_empty() {
                    return Err(CatalogError::CreationRejected(fmt_user_errors(
                        &operation.user_errors,
                    )));
                }
                Ok(CreationOutcome::Operation {
                    id: operation.id,
                    status: operation.status,
                    product_id: operation.product.map(|product| product.id),
                })
            },
            (Some(_), Some(_)) => Err(CatalogError::ProtocolViolation(
                "submission returned both a product and an operation".to_string(),
            )),
            (None, None) => Err(CatalogError::ProtocolViolation(
                "submission returned neither a product nor an operation".to_string(),
            )),
        }
    }
}

/// Whether the backend should be asked to create `request` synchronously.
///
/// This is a hint, the backend may still answer with an operation.
pub fn prefers_synchronous(request: &CreateRequest) -> bool {
    request.variants.len() <= SYNCHRONOUS_VARIANT_LIMIT
}

/// Translate a validated request into the mutation input.
pub fn build_product_set_input(request: &CreateRequest) -> Result<ProductSetInput, CatalogError> {
    let product_options = request
        .options
        .iter()
        .zip(1..)
        .map(|(group, position)| OptionSetInput {
            name: group.name.clone(),
            position,
            values: group
                .values
                .iter()
                .map(|value| NameInput {
                    name: value.name.clone(),
                })
                .collect(),
        })
        .collect();

    let variants = request
        .variants
        .iter()
        .map(variant_input)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductSetInput {
        title: request.title.trim().to_string(),
        description_html: request.description_html.clone(),
        product_type: request.category.clone(),
        vendor: request.vendor.clone(),
        tags: request.tags.clone(),
        product_options,
        variants,
        files: request.files.iter().map(file_input).collect(),
    })
}

fn variant_input(variant: &VariantInput) -> Result<VariantSetInput, CatalogError> {
    let inventory_quantities = variant
        .inventory_quantities
        .iter()
        .map(|quantity| {
            let location_id = ensure_resource_id(&quantity.location_id, ResourceKind::Location)?;
            Ok(InventoryQuantitySetInput {
                location_id: location_id.to_string(),
                name: AVAILABLE_QUANTITY,
                quantity: quantity.quantity,
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    let sku = variant.sku.clone().filter(|sku| !sku.trim().is_empty());
    let tracked = variant.inventory_item.map(|item| item.tracked);
    let inventory_item = (sku.is_some() || tracked.is_some())
        .then_some(InventoryItemSetInput { sku, tracked });

    Ok(VariantSetInput {
        option_values: variant
            .option_values
            .iter()
            .map(|value| VariantOptionValueSetInput {
                option_name: value.option_name.clone(),
                name: value.name.clone(),
            })
            .collect(),
        price: format_price(variant.price),
        inventory_item,
        file: variant.file.as_ref().map(file_input),
        inventory_quantities,
    })
}

/// A price as the backend receives it, a decimal string rounded to cents.
pub(crate) fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

fn file_input(file: &FileInput) -> FileSetInput {
    FileSetInput {
        original_source: file.original_source.clone(),
        alt: file.alt.clone(),
        content_type: file.content_type,
    }
}

/// Submit `request` and wait for the product to exist.
///
/// Returns the local id of the created product.
pub(crate) async fn create_product(
    transport: &Transport,
    request: &CreateRequest,
    policy: CreationPolicy,
    cancel: &CancellationToken,
) -> Result<String, CatalogError> {
    let input = build_product_set_input(request)?;
    let synchronous = prefers_synchronous(request);
    let submitted = Instant::now();

    debug!(
        variants = request.variants.len(),
        synchronous, "submitting product set"
    );
    let data: ProductSetData = transport
        .query(
            documents::PRODUCT_SET,
            json!({ "input": input, "synchronous": synchronous }),
        )
        .await?;

    let payload = data.product_set.ok_or_else(|| {
        CatalogError::ProtocolViolation("productSet returned no payload".to_string())
    })?;

    match CreationOutcome::try_from(payload)? {
        CreationOutcome::Immediate(product_id) => {
            debug!(%product_id, "product created synchronously");
            Ok(to_local(&product_id))
        },
        CreationOutcome::Operation {
            id,
            status,
            product_id,
        } => {
            debug!(operation = %id, %status, "product creation continues in the background");
            if let Some(product_id) = settle(status.clone(), product_id)? {
                return Ok(product_id);
            }
            poll_operation(transport, &id, status, policy, submitted, cancel).await
        },
    }
}

/// Terminal product id of an operation in `status`, if it has one.
fn settle(status: OperationStatus, product_id: Option<String>) -> Result<Option<String>, CatalogError> {
    if !status.is_complete() {
        return Ok(None);
    }
    match product_id {
        Some(product_id) => Ok(Some(to_local(&product_id))),
        None => Err(CatalogError::ProtocolViolation(
            "operation completed without a product".to_string(),
        )),
    }
}

async fn fetch_operation(transport: &Transport, id: &str) -> Result<RawOperation, CatalogError> {
    let data: ProductOperationData = transport
        .query(documents::PRODUCT_SET_OPERATION, json!({ "id": id }))
        .await?;

    let operation = data.product_operation.ok_or_else(|| {
        CatalogError::ProtocolViolation(format!("operation {id} does not exist"))
    })?;

    if !operation.user_errors.is_empty() {
        return Err(CatalogError::CreationRejected(fmt_user_errors(
            &operation.user_errors,
        )));
    }
    Ok(operation)
}

/// Poll operation `id` until it completes.
///
/// The first poll is sent right away, later polls are spaced by the policy
/// interval. The deadline counts from `submitted`, and the final poll is
/// sent at the deadline at the latest.
async fn poll_operation(
    transport: &Transport,
    id: &str,
    mut last_status: OperationStatus,
    policy: CreationPolicy,
    submitted: Instant,
    cancel: &CancellationToken,
) -> Result<String, CatalogError> {
    let deadline = submitted + policy.timeout;
    let mut polls = 0_u32;

    loop {
        let operation = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation = id, polls, "creation polling cancelled");
                return Err(CatalogError::Cancelled { last_status });
            },
            operation = fetch_operation(transport, id) => operation?,
        };
        polls += 1;
        last_status = operation.status.clone();
        debug!(operation = id, polls, status = %last_status, "polled product set operation");

        if let Some(product_id) = settle(operation.status, operation.product.map(|p| p.id))? {
            return Ok(product_id);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(CatalogError::CreationTimedOut { last_status });
        }

        let wake = (now + policy.poll_interval).min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation = id, polls, "creation polling cancelled");
                return Err(CatalogError::Cancelled { last_status });
            },
            _ = sleep(wake - now) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::mock::MockTransport;
    use crate::types::{
        InventoryItemInput,
        InventoryQuantityInput,
        OptionGroup,
        OptionValueInput,
        VariantOptionValue,
    };

    const POLICY: CreationPolicy = CreationPolicy {
        poll_interval: Duration::from_millis(1500),
        timeout: Duration::from_secs(120),
    };

    fn request(variants: usize) -> CreateRequest {
        let values = (0..variants).map(|n| format!("v{n}")).collect::<Vec<_>>();
        CreateRequest {
            title: " Poster ".to_string(),
            options: vec![OptionGroup {
                name: "Number".to_string(),
                values: values
                    .iter()
                    .map(|name| OptionValueInput { name: name.clone() })
                    .collect(),
            }],
            variants: values
                .iter()
                .map(|name| VariantInput {
                    option_values: vec![VariantOptionValue {
                        option_name: "Number".to_string(),
                        name: name.clone(),
                    }],
                    price: 9.5,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn operation(status: &str, product: Option<&str>) -> Value {
        json!({
            "id": "gid://shopify/ProductSetOperation/900",
            "status": status,
            "product": product.map(|id| json!({ "id": id })),
            "userErrors": []
        })
    }

    fn submitted_operation(mock: &MockTransport, status: &str) {
        mock.push_data(json!({
            "productSet": {
                "product": null,
                "productSetOperation": operation(status, None),
                "userErrors": []
            }
        }));
    }

    fn polled(mock: &MockTransport, status: &str, product: Option<&str>) {
        mock.push_data(json!({ "productOperation": operation(status, product) }));
    }

    fn polls(mock: &MockTransport) -> usize {
        mock.operation_names()
            .iter()
            .filter(|name| *name == "ProductSetOperation")
            .count()
    }

    #[test]
    fn input_maps_options_variants_and_inventory() {
        let mut request = request(2);
        request.category = Some("Prints".to_string());
        request.variants[0].sku = Some("P-0".to_string());
        request.variants[0].inventory_item = Some(InventoryItemInput { tracked: true });
        request.variants[0].inventory_quantities = vec![InventoryQuantityInput {
            location_id: "77".to_string(),
            quantity: 4,
        }];

        let input = build_product_set_input(&request).unwrap();
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "title": "Poster",
                "productType": "Prints",
                "productOptions": [
                    { "name": "Number", "position": 1, "values": [{ "name": "v0" }, { "name": "v1" }] }
                ],
                "variants": [
                    {
                        "optionValues": [{ "optionName": "Number", "name": "v0" }],
                        "price": "9.50",
                        "inventoryItem": { "sku": "P-0", "tracked": true },
                        "inventoryQuantities": [
                            { "locationId": "gid://shopify/Location/77", "name": "available", "quantity": 4 }
                        ]
                    },
                    {
                        "optionValues": [{ "optionName": "Number", "name": "v1" }],
                        "price": "9.50"
                    }
                ]
            })
        );
    }

    #[test]
    fn synchronous_hint_follows_variant_count() {
        assert!(prefers_synchronous(&request(10)));
        assert!(!prefers_synchronous(&request(11)));
    }

    #[test]
    fn submission_shapes() {
        let payload = |value: Value| -> ProductSetPayload { serde_json::from_value(value).unwrap() };

        let both = payload(json!({
            "product": { "id": "gid://shopify/Product/1" },
            "productSetOperation": operation("ACTIVE", None),
            "userErrors": []
        }));
        assert!(matches!(
            CreationOutcome::try_from(both),
            Err(CatalogError::ProtocolViolation(_))
        ));

        let neither = payload(json!({ "product": null, "productSetOperation": null, "userErrors": [] }));
        assert!(matches!(
            CreationOutcome::try_from(neither),
            Err(CatalogError::ProtocolViolation(_))
        ));

        let rejected = payload(json!({
            "product": null,
            "productSetOperation": null,
            "userErrors": [{ "field": ["input", "title"], "message": "can't be blank" }]
        }));
        match CreationOutcome::try_from(rejected) {
            Err(CatalogError::CreationRejected(message)) => {
                assert_eq!(message, "input.title: can't be blank")
            },
            other => panic!("expected rejection, found: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn synchronous_creation_needs_no_polls() {
        let mock = MockTransport::new();
        mock.push_data(json!({
            "productSet": {
                "product": { "id": "gid://shopify/Product/42" },
                "productSetOperation": null,
                "userErrors": []
            }
        }));
        let transport = Transport::Mock(mock.clone());

        let id = create_product(&transport, &request(3), POLICY, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(id, "42");
        assert_eq!(mock.operation_names(), vec!["ProductSet"]);
        assert_eq!(mock.requests()[0].variables["synchronous"], json!(true));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_operation_at_submission_needs_no_polls() {
        let mock = MockTransport::new();
        mock.push_data(json!({
            "productSet": {
                "product": null,
                "productSetOperation": operation("COMPLETE", Some("gid://shopify/Product/43")),
                "userErrors": []
            }
        }));
        let transport = Transport::Mock(mock.clone());

        let id = create_product(&transport, &request(50), POLICY, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(id, "43");
        assert_eq!(polls(&mock), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn asynchronous_creation_polls_until_complete() {
        let mock = MockTransport::new();
        submitted_operation(&mock, "ACTIVE");
        polled(&mock, "ACTIVE", None);
        polled(&mock, "ACTIVE", None);
        polled(&mock, "COMPLETE", Some("gid://shopify/Product/42"));
        let transport = Transport::Mock(mock.clone());

        let start = Instant::now();
        let id = create_product(&transport, &request(50), POLICY, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(id, "42");
        assert_eq!(polls(&mock), 3);
        assert_eq!(start.elapsed(), POLICY.poll_interval * 2);
        assert_eq!(mock.requests()[0].variables["synchronous"], json!(false));
        assert_eq!(
            mock.requests()[1].variables,
            json!({ "id": "gid://shopify/ProductSetOperation/900" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_reports_last_status() {
        let policy = CreationPolicy {
            poll_interval: Duration::from_millis(1500),
            timeout: Duration::from_secs(5),
        };
        let mock = MockTransport::new();
        submitted_operation(&mock, "CREATED");
        for _ in 0..10 {
            polled(&mock, "ACTIVE", None);
        }
        let transport = Transport::Mock(mock.clone());

        let start = Instant::now();
        let err = create_product(&transport, &request(50), policy, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            CatalogError::CreationTimedOut { last_status } => {
                assert_eq!(last_status, OperationStatus::Active)
            },
            other => panic!("expected timeout, found: {other:?}"),
        }
        // polls at 0s, 1.5s, 3s, 4.5s and a final one at the deadline
        assert_eq!(polls(&mock), 5);
        assert_eq!(start.elapsed(), policy.timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn operation_user_errors_stop_polling() {
        let mock = MockTransport::new();
        submitted_operation(&mock, "ACTIVE");
        mock.push_data(json!({
            "productOperation": {
                "id": "gid://shopify/ProductSetOperation/900",
                "status": "COMPLETE",
                "product": null,
                "userErrors": [{ "field": null, "message": "Media failed to process" }]
            }
        }));
        polled(&mock, "COMPLETE", Some("gid://shopify/Product/1"));
        let transport = Transport::Mock(mock.clone());

        let err = create_product(&transport, &request(50), POLICY, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, CatalogError::CreationRejected(ref message) if message == "Media failed to process"),
            "found: {err:?}"
        );
        assert_eq!(mock.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn complete_without_product_is_a_protocol_violation() {
        let mock = MockTransport::new();
        submitted_operation(&mock, "ACTIVE");
        polled(&mock, "COMPLETE", None);
        let transport = Transport::Mock(mock.clone());

        let err = create_product(&transport, &request(50), POLICY, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProtocolViolation(_)), "found: {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let mock = MockTransport::new();
        submitted_operation(&mock, "ACTIVE");
        for _ in 0..10 {
            polled(&mock, "ACTIVE", None);
        }
        let transport = Transport::Mock(mock.clone());
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(2000)).await;
                cancel.cancel();
            })
        };

        let err = create_product(&transport, &request(50), POLICY, &cancel)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(
            matches!(err, CatalogError::Cancelled { last_status: OperationStatus::Active }),
            "found: {err:?}"
        );
        // polls at 0s and 1.5s, cancelled while waiting for the 3s poll
        assert_eq!(polls(&mock), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_not_retried() {
        let mock = MockTransport::new();
        submitted_operation(&mock, "ACTIVE");
        mock.push_status(502, "bad gateway");
        polled(&mock, "COMPLETE", Some("gid://shopify/Product/1"));
        let transport = Transport::Mock(mock.clone());

        let err = create_product(&transport, &request(50), POLICY, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::TransportError(_)), "found: {err:?}");
        assert_eq!(mock.remaining(), 1);
    }
}
