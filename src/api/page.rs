//! Server-rendered HTML form.

use crate::features::FeatureRecord;
use minijinja::{context, Environment};

const INDEX_TEMPLATE: &str = include_str!("index.html");

pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render_form(&self, model_loaded: bool) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { model_loaded })
    }

    pub fn render_prediction(
        &self,
        model_loaded: bool,
        prediction: f64,
        record: &FeatureRecord,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {
            model_loaded,
            prediction => format_price(prediction),
            postcode_area => record.postcode_area.trim(),
            latitude => record.latitude,
            longitude => record.longitude,
        })
    }
}

/// Whole pounds with thousands separators, e.g. `1,234,567`.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
