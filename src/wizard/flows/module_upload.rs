//! Marketplace module submission.

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{Backend, BackendError};
use crate::types::{DeviceKind, ModuleCategory, NewModule, Pricing, PricingModel};
use crate::wizard::validate::split_list;
use crate::wizard::{
    field_value, FieldKind, FieldSpec, Flow, FlowFields, Rule, StepOutcome, StepSchema,
    WizardStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UploadStep {
    Details,
    Package,
    Pricing,
    Review,
    Done,
}

impl WizardStep for UploadStep {
    fn sequence() -> &'static [Self] {
        &[
            UploadStep::Details,
            UploadStep::Package,
            UploadStep::Pricing,
            UploadStep::Review,
            UploadStep::Done,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            UploadStep::Details => "Details",
            UploadStep::Package => "Package",
            UploadStep::Pricing => "Pricing",
            UploadStep::Review => "Review",
            UploadStep::Done => "Done",
        }
    }
}

pub struct ModuleUploadFlow {
    backend: Arc<dyn Backend>,
    publisher: String,
}

impl ModuleUploadFlow {
    pub fn new(backend: Arc<dyn Backend>, publisher: impl Into<String>) -> Self {
        Self {
            backend,
            publisher: publisher.into(),
        }
    }
}

/// Price consistent with the pricing model: zero for free modules, positive
/// otherwise
pub fn check_pricing(model: PricingModel, price: f64) -> Result<(), BackendError> {
    match model {
        PricingModel::Free if price != 0.0 => Err(BackendError::Conflict(
            "free modules must have a price of 0".to_string(),
        )),
        PricingModel::OneTime | PricingModel::Subscription if price <= 0.0 => {
            Err(BackendError::Conflict(format!(
                "{} pricing needs a price above 0",
                model.label().to_lowercase()
            )))
        }
        _ => Ok(()),
    }
}

fn pricing_from_fields(fields: &FlowFields<UploadStep>) -> Result<Pricing, BackendError> {
    let model_key = field_value(fields, UploadStep::Pricing, "model");
    let model = PricingModel::from_key(model_key)
        .ok_or_else(|| BackendError::Conflict(format!("unknown pricing model '{}'", model_key)))?;
    let price = field_value(fields, UploadStep::Pricing, "price")
        .parse::<f64>()
        .unwrap_or(0.0);
    check_pricing(model, price)?;
    Ok(Pricing { model, price })
}

/// Module input assembled from every step
pub fn module_from_fields(
    fields: &FlowFields<UploadStep>,
    publisher: &str,
) -> Result<NewModule, BackendError> {
    let category_key = field_value(fields, UploadStep::Details, "category");
    let category = ModuleCategory::from_key(category_key)
        .ok_or_else(|| BackendError::Conflict(format!("unknown category '{}'", category_key)))?;
    let compatible_devices = split_list(field_value(fields, UploadStep::Package, "devices"))
        .filter_map(DeviceKind::from_key)
        .collect();

    Ok(NewModule {
        name: field_value(fields, UploadStep::Details, "name").to_string(),
        category,
        version: field_value(fields, UploadStep::Package, "version").to_string(),
        description: field_value(fields, UploadStep::Details, "description").to_string(),
        package_url: field_value(fields, UploadStep::Package, "package_url").to_string(),
        pricing: pricing_from_fields(fields)?,
        publisher: publisher.to_string(),
        compatible_devices,
    })
}

/// Inputs of each step, shared with the REST API
pub fn step_schema(step: UploadStep) -> StepSchema {
    match step {
        UploadStep::Details => StepSchema::new(vec![
            FieldSpec::new("name", "Module name")
                .rule(Rule::Required)
                .rule(Rule::MinLength(3))
                .rule(Rule::MaxLength(60)),
            FieldSpec::new("category", "Category")
                .rule(Rule::Required)
                .choice(
                    ModuleCategory::all()
                        .iter()
                        .map(|c| (c.key().to_string(), c.label().to_string()))
                        .collect(),
                ),
            FieldSpec::new("description", "Description")
                .kind(FieldKind::Multiline)
                .rule(Rule::Required)
                .rule(Rule::MinLength(20))
                .rule(Rule::MaxLength(500)),
        ]),
        UploadStep::Package => StepSchema::new(vec![
            FieldSpec::new("version", "Version")
                .rule(Rule::Required)
                .rule(Rule::Version)
                .placeholder("1.0.0"),
            FieldSpec::new("package_url", "Package URL")
                .rule(Rule::Required)
                .rule(Rule::Url),
            FieldSpec::new("devices", "Compatible devices")
                .rule(Rule::EachOneOf(
                    DeviceKind::all().iter().map(|k| k.key().to_string()).collect(),
                ))
                .placeholder("temperature, humidity"),
        ]),
        UploadStep::Pricing => StepSchema::new(vec![
            FieldSpec::new("model", "Pricing model")
                .rule(Rule::Required)
                .choice(
                    PricingModel::all()
                        .iter()
                        .map(|m| (m.key().to_string(), m.label().to_string()))
                        .collect(),
                ),
            FieldSpec::new("price", "Price (USD)")
                .rule(Rule::Required)
                .rule(Rule::Decimal { min: 0.0 })
                .placeholder("0.00"),
        ]),
        UploadStep::Review | UploadStep::Done => StepSchema::empty(),
    }
}

#[async_trait]
impl Flow for ModuleUploadFlow {
    type Step = UploadStep;

    fn title(&self) -> &'static str {
        "Submit a module"
    }

    fn schema(&self, step: UploadStep) -> StepSchema {
        step_schema(step)
    }

    async fn submit(
        &self,
        step: UploadStep,
        fields: &FlowFields<UploadStep>,
    ) -> Result<StepOutcome, BackendError> {
        match step {
            UploadStep::Pricing => {
                pricing_from_fields(fields)?;
                Ok(StepOutcome::local())
            }
            UploadStep::Review => {
                let input = module_from_fields(fields, &self.publisher)?;
                let module = self.backend.submit_module(input).await?;
                Ok(StepOutcome::notice(format!(
                    "{} {} was submitted for review",
                    module.name, module.version
                ))
                .with_receipt("Module ID", module.id))
            }
            UploadStep::Details | UploadStep::Package | UploadStep::Done => {
                Ok(StepOutcome::local())
            }
        }
    }

    fn field_for_error(&self, step: UploadStep, error: &BackendError) -> Option<&'static str> {
        match (step, error) {
            (UploadStep::Pricing, BackendError::Conflict(_)) => Some("price"),
            _ => None,
        }
    }
}
