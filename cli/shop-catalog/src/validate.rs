//! Request validation performed before anything is sent to the backend.
//!
//! Each check is a named rule. Rules run in a fixed order and every
//! violation is reported, so a caller can fix all problems at once.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::create::format_price;
use crate::error::{ValidationErrors, Violation};
use crate::ids::{ResourceKind, ensure_resource_id};
use crate::types::{CreateRequest, MAX_PAGE_LIMIT, SearchRequest};

/// Most option groups a product can declare.
pub const MAX_OPTION_GROUPS: usize = 3;
/// Most variants a single create request can carry.
pub const MAX_VARIANTS: usize = 100;

#[derive(Debug, Default)]
struct Findings {
    rule: &'static str,
    violations: Vec<Violation>,
}

impl Findings {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            rule: self.rule,
            path: path.into(),
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.violations))
        }
    }
}

type Rule<T> = fn(&T, &mut Findings);

const SEARCH_RULES: &[(&str, Rule<SearchRequest>)] = &[
    ("page_positive", page_positive),
    ("limit_in_range", limit_in_range),
];

const CREATE_RULES: &[(&str, Rule<CreateRequest>)] = &[
    ("title_present", title_present),
    ("option_group_limit", option_group_limit),
    ("option_values_distinct", option_values_distinct),
    ("variant_limit", variant_limit),
    ("variant_price_positive", variant_price_positive),
    ("option_reference_declared", option_reference_declared),
    ("option_combination_unique", option_combination_unique),
    ("variant_media_declared", variant_media_declared),
    ("inventory_requires_tracking", inventory_requires_tracking),
    ("quantity_non_negative", quantity_non_negative),
    ("location_id_valid", location_id_valid),
];

fn run<T>(rules: &[(&'static str, Rule<T>)], request: &T) -> Result<(), ValidationErrors> {
    let mut findings = Findings::default();
    for &(name, rule) in rules {
        findings.rule = name;
        rule(request, &mut findings);
    }
    findings.finish()
}

/// Check paging bounds of a search.
pub fn validate_search(request: &SearchRequest) -> Result<(), ValidationErrors> {
    run(SEARCH_RULES, request)
}

/// Check the structural invariants of a create request.
pub fn validate_create(request: &CreateRequest) -> Result<(), ValidationErrors> {
    run(CREATE_RULES, request)
}

// ---------------------------------------------------------------------------
// Search rules
// ---------------------------------------------------------------------------

fn page_positive(request: &SearchRequest, findings: &mut Findings) {
    if request.page == 0 {
        findings.push("page", "page numbers start at 1");
    }
}

fn limit_in_range(request: &SearchRequest, findings: &mut Findings) {
    if !(1..=MAX_PAGE_LIMIT).contains(&request.limit) {
        findings.push(
            "limit",
            format!("limit must be between 1 and {MAX_PAGE_LIMIT}, got {}", request.limit),
        );
    }
}

// ---------------------------------------------------------------------------
// Create rules
// ---------------------------------------------------------------------------

fn title_present(request: &CreateRequest, findings: &mut Findings) {
    if request.title.trim().is_empty() {
        findings.push("title", "title must not be blank");
    }
}

fn option_group_limit(request: &CreateRequest, findings: &mut Findings) {
    if request.options.len() > MAX_OPTION_GROUPS {
        findings.push(
            "options",
            format!(
                "at most {MAX_OPTION_GROUPS} option groups are allowed, got {}",
                request.options.len()
            ),
        );
    }
}

fn option_values_distinct(request: &CreateRequest, findings: &mut Findings) {
    let mut names = BTreeSet::new();
    for (index, group) in request.options.iter().enumerate() {
        if !names.insert(group.name.as_str()) {
            findings.push(
                format!("options.{index}.name"),
                format!("option group '{}' is declared twice", group.name),
            );
        }

        let mut values = BTreeSet::new();
        for (value_index, value) in group.values.iter().enumerate() {
            if !values.insert(value.name.as_str()) {
                findings.push(
                    format!("options.{index}.values.{value_index}"),
                    format!("value '{}' is listed twice for '{}'", value.name, group.name),
                );
            }
        }
    }
}

fn variant_limit(request: &CreateRequest, findings: &mut Findings) {
    if request.variants.len() > MAX_VARIANTS {
        findings.push(
            "variants",
            format!(
                "at most {MAX_VARIANTS} variants are allowed, got {}",
                request.variants.len()
            ),
        );
    }
}

/// Checks the price as it is submitted, rounded to cents.
fn variant_price_positive(request: &CreateRequest, findings: &mut Findings) {
    for (index, variant) in request.variants.iter().enumerate() {
        let submitted = variant
            .price
            .is_finite()
            .then(|| format_price(variant.price).parse::<f64>().ok())
            .flatten();
        if !submitted.is_some_and(|price| price > 0.0) {
            findings.push(
                format!("variants.{index}.price"),
                format!("price must be at least 0.01, got {}", variant.price),
            );
        }
    }
}

fn option_reference_declared(request: &CreateRequest, findings: &mut Findings) {
    let declared: HashMap<&str, BTreeSet<&str>> = request
        .options
        .iter()
        .map(|group| {
            let values = group.values.iter().map(|value| value.name.as_str()).collect();
            (group.name.as_str(), values)
        })
        .collect();

    for (index, variant) in request.variants.iter().enumerate() {
        for (value_index, reference) in variant.option_values.iter().enumerate() {
            let path = format!("variants.{index}.optionValues.{value_index}");
            match declared.get(reference.option_name.as_str()) {
                None => findings.push(
                    path,
                    format!("option '{}' is not declared", reference.option_name),
                ),
                Some(values) if !values.contains(reference.name.as_str()) => findings.push(
                    path,
                    format!(
                        "value '{}' is not declared for option '{}'",
                        reference.name, reference.option_name
                    ),
                ),
                Some(_) => {},
            }
        }
    }
}

fn option_combination_unique(request: &CreateRequest, findings: &mut Findings) {
    // combinations are compared regardless of the order values are listed in
    let mut seen: BTreeMap<BTreeSet<(&str, &str)>, usize> = BTreeMap::new();

    for (index, variant) in request.variants.iter().enumerate() {
        let combination = variant
            .option_values
            .iter()
            .map(|value| (value.option_name.as_str(), value.name.as_str()))
            .collect::<BTreeSet<_>>();

        if let Some(first) = seen.get(&combination) {
            findings.push(
                format!("variants.{index}.optionValues"),
                format!("repeats the option combination of variants.{first}"),
            );
        } else {
            seen.insert(combination, index);
        }
    }
}

fn variant_media_declared(request: &CreateRequest, findings: &mut Findings) {
    let files = request
        .files
        .iter()
        .map(|file| file.original_source.as_str())
        .collect::<BTreeSet<_>>();

    for (index, variant) in request.variants.iter().enumerate() {
        if let Some(file) = &variant.file {
            if !files.contains(file.original_source.as_str()) {
                findings.push(
                    format!("variants.{index}.file"),
                    format!(
                        "media '{}' must also be listed in the product files",
                        file.original_source
                    ),
                );
            }
        }
    }
}

fn inventory_requires_tracking(request: &CreateRequest, findings: &mut Findings) {
    for (index, variant) in request.variants.iter().enumerate() {
        let tracked = variant.inventory_item.is_some_and(|item| item.tracked);
        if !variant.inventory_quantities.is_empty() && !tracked {
            findings.push(
                format!("variants.{index}.inventoryItem.tracked"),
                "inventory quantities require inventory tracking",
            );
        }
    }
}

fn quantity_non_negative(request: &CreateRequest, findings: &mut Findings) {
    for (index, variant) in request.variants.iter().enumerate() {
        for (quantity_index, quantity) in variant.inventory_quantities.iter().enumerate() {
            if quantity.quantity < 0 {
                findings.push(
                    format!("variants.{index}.inventoryQuantities.{quantity_index}.quantity"),
                    format!("quantity must not be negative, got {}", quantity.quantity),
                );
            }
        }
    }
}

fn location_id_valid(request: &CreateRequest, findings: &mut Findings) {
    for (index, variant) in request.variants.iter().enumerate() {
        for (quantity_index, quantity) in variant.inventory_quantities.iter().enumerate() {
            if let Err(err) = ensure_resource_id(&quantity.location_id, ResourceKind::Location) {
                findings.push(
                    format!("variants.{index}.inventoryQuantities.{quantity_index}.locationId"),
                    err.to_string(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{
        FileInput,
        InventoryItemInput,
        InventoryQuantityInput,
        OptionGroup,
        OptionValueInput,
        VariantInput,
        VariantOptionValue,
    };

    fn group(name: &str, values: &[&str]) -> OptionGroup {
        OptionGroup {
            name: name.to_string(),
            values: values
                .iter()
                .map(|value| OptionValueInput {
                    name: value.to_string(),
                })
                .collect(),
        }
    }

    fn variant(values: &[(&str, &str)], price: f64) -> VariantInput {
        VariantInput {
            option_values: values
                .iter()
                .map(|(option_name, name)| VariantOptionValue {
                    option_name: option_name.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            price,
            ..Default::default()
        }
    }

    fn shirt() -> CreateRequest {
        CreateRequest {
            title: "Shirt".to_string(),
            options: vec![group("Size", &["S", "M"]), group("Color", &["Red", "Blue"])],
            variants: vec![
                variant(&[("Size", "S"), ("Color", "Red")], 10.0),
                variant(&[("Size", "M"), ("Color", "Red")], 10.0),
                variant(&[("Size", "S"), ("Color", "Blue")], 12.0),
            ],
            ..Default::default()
        }
    }

    fn rules(result: Result<(), ValidationErrors>) -> Vec<&'static str> {
        result
            .unwrap_err()
            .violations()
            .iter()
            .map(|violation| violation.rule)
            .collect()
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(validate_create(&shirt()), Ok(()));
    }

    #[test]
    fn duplicate_combination_is_rejected() {
        let request = CreateRequest {
            title: "Shirt".to_string(),
            options: vec![group("Size", &["S", "M"])],
            variants: vec![variant(&[("Size", "S")], 10.0), variant(&[("Size", "S")], 11.0)],
            ..Default::default()
        };
        let errors = validate_create(&request).unwrap_err();
        assert_eq!(errors.violations(), &[Violation {
            rule: "option_combination_unique",
            path: "variants.1.optionValues".to_string(),
            message: "repeats the option combination of variants.0".to_string(),
        }]);
    }

    #[test]
    fn combination_order_does_not_matter() {
        let mut request = shirt();
        request
            .variants
            .push(variant(&[("Color", "Red"), ("Size", "M")], 10.0));
        assert_eq!(rules(validate_create(&request)), vec!["option_combination_unique"]);
    }

    #[test]
    fn undeclared_references_are_rejected() {
        let mut request = shirt();
        request.variants[0].option_values[1].name = "Green".to_string();
        request.variants[1].option_values[0].option_name = "Fit".to_string();
        let errors = validate_create(&request).unwrap_err();
        let paths = errors
            .violations()
            .iter()
            .filter(|violation| violation.rule == "option_reference_declared")
            .map(|violation| violation.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["variants.0.optionValues.1", "variants.1.optionValues.0"]);
    }

    #[test]
    fn inventory_without_tracking_is_rejected() {
        let mut request = shirt();
        request.variants[2].inventory_quantities = vec![InventoryQuantityInput {
            location_id: "5".to_string(),
            quantity: 3,
        }];
        assert_eq!(rules(validate_create(&request)), vec!["inventory_requires_tracking"]);

        request.variants[2].inventory_item = Some(InventoryItemInput { tracked: true });
        assert_eq!(validate_create(&request), Ok(()));
    }

    #[test]
    fn location_ids_must_be_numeric_or_global() {
        let mut request = shirt();
        request.variants[0].inventory_item = Some(InventoryItemInput { tracked: true });
        request.variants[0].inventory_quantities = vec![
            InventoryQuantityInput {
                location_id: "gid://shopify/Location/5".to_string(),
                quantity: 1,
            },
            InventoryQuantityInput {
                location_id: "main-warehouse".to_string(),
                quantity: 1,
            },
        ];
        let errors = validate_create(&request).unwrap_err();
        assert_eq!(errors.violations().len(), 1);
        assert_eq!(
            errors.violations()[0].path,
            "variants.0.inventoryQuantities.1.locationId"
        );
    }

    #[test]
    fn prices_rounding_to_zero_are_rejected() {
        let mut request = shirt();
        request.variants[0].price = 0.004;
        request.variants[1].price = f64::NAN;
        request.variants[2].price = -1.0;
        let errors = validate_create(&request).unwrap_err();
        let paths = errors
            .violations()
            .iter()
            .map(|violation| violation.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["variants.0.price", "variants.1.price", "variants.2.price"]);

        request.variants[0].price = 0.006;
        request.variants[1].price = 0.01;
        request.variants[2].price = 0.009;
        assert_eq!(validate_create(&request), Ok(()));
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let mut request = shirt();
        request.variants[0].inventory_item = Some(InventoryItemInput { tracked: true });
        request.variants[0].inventory_quantities = vec![
            InventoryQuantityInput {
                location_id: "5".to_string(),
                quantity: 0,
            },
            InventoryQuantityInput {
                location_id: "6".to_string(),
                quantity: -2,
            },
        ];
        let errors = validate_create(&request).unwrap_err();
        assert_eq!(errors.violations(), &[Violation {
            rule: "quantity_non_negative",
            path: "variants.0.inventoryQuantities.1.quantity".to_string(),
            message: "quantity must not be negative, got -2".to_string(),
        }]);
    }

    #[test]
    fn variant_media_must_be_listed() {
        let file = FileInput {
            original_source: "https://cdn/red.png".to_string(),
            alt: None,
            content_type: Default::default(),
        };
        let mut request = shirt();
        request.variants[0].file = Some(file.clone());
        assert_eq!(rules(validate_create(&request)), vec!["variant_media_declared"]);

        request.files.push(file);
        assert_eq!(validate_create(&request), Ok(()));
    }

    #[test]
    fn violations_are_reported_in_rule_order() {
        let mut request = shirt();
        request.title = "  ".to_string();
        request.variants[1].price = 0.0;
        request.variants[2] = request.variants[0].clone();
        request.options.push(group("Fit", &["Slim", "Slim"]));
        request.options.push(group("Sleeve", &["Long"]));

        assert_eq!(rules(validate_create(&request)), vec![
            "title_present",
            "option_group_limit",
            "option_values_distinct",
            "variant_price_positive",
            "option_combination_unique",
        ]);
    }

    #[test]
    fn too_many_variants() {
        let mut request = CreateRequest {
            title: "Poster".to_string(),
            options: vec![group("Number", &[])],
            ..Default::default()
        };
        for n in 0..=MAX_VARIANTS {
            let name = n.to_string();
            request.options[0].values.push(OptionValueInput { name: name.clone() });
            request.variants.push(variant(&[("Number", name.as_str())], 1.0));
        }
        assert_eq!(rules(validate_create(&request)), vec!["variant_limit"]);
    }

    #[test]
    fn search_bounds() {
        let request = SearchRequest {
            page: 0,
            limit: 101,
            ..Default::default()
        };
        assert_eq!(rules(validate_search(&request)), vec!["page_positive", "limit_in_range"]);
        assert_eq!(validate_search(&SearchRequest::default()), Ok(()));
    }
}
