//! netCDF / OPeNDAP reader built on libnetcdf.
//!
//! Decoding mirrors what xarray does on open: fill and missing values are
//! masked to NaN, then `scale_factor` / `add_offset` are applied.

use anyhow::{Context, Result};

use super::model::{AttributeValue, Attributes, ProfileDataset, Variable};

/// Magnitudes at or above this are treated as fill (netCDF default fill is ~9.97e36).
const FILL_THRESHOLD: f64 = 1.0e30;

#[inline]
fn is_valid(v: f64) -> bool {
    v.is_finite() && v.abs() < FILL_THRESHOLD
}

/// Open `location` (file path or OPeNDAP URL) and read every numeric variable.
pub fn load_netcdf(location: &str) -> Result<ProfileDataset> {
    let file = netcdf::open(location).context("opening netCDF dataset")?;

    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("skipping non-numeric variable '{name}': {e}");
                continue;
            }
        };

        let attributes = read_attributes(var.attributes());
        let values = decode(&raw, &attributes);
        let mut variable = Variable::new(name.clone(), shape, values)
            .with_context(|| format!("reading variable '{name}'"))?;
        variable.attributes = attributes;
        variables.push(variable);
    }

    let mut dataset = ProfileDataset::from_variables(location, variables);
    dataset.attributes = read_attributes(file.attributes());
    Ok(dataset)
}

fn read_attributes<'a>(attrs: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attributes {
    attrs
        .filter_map(|attr| {
            let value = attr.value().ok().and_then(convert_attribute)?;
            Some((attr.name().to_string(), value))
        })
        .collect()
}

fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttributeValue> {
    use netcdf::AttributeValue as Nc;
    let converted = match value {
        Nc::Str(s) => AttributeValue::Text(s),
        Nc::Strs(ss) => AttributeValue::Text(ss.join(" ")),
        Nc::Double(d) => AttributeValue::Number(d),
        Nc::Float(f) => AttributeValue::Number(f as f64),
        Nc::Int(i) => AttributeValue::Number(i as f64),
        Nc::Uint(u) => AttributeValue::Number(u as f64),
        Nc::Short(s) => AttributeValue::Number(s as f64),
        Nc::Ushort(u) => AttributeValue::Number(u as f64),
        Nc::Schar(c) => AttributeValue::Number(c as f64),
        Nc::Uchar(c) => AttributeValue::Number(c as f64),
        Nc::Longlong(l) => AttributeValue::Number(l as f64),
        Nc::Ulonglong(l) => AttributeValue::Number(l as f64),
        Nc::Doubles(ds) => AttributeValue::Numbers(ds),
        Nc::Floats(fs) => AttributeValue::Numbers(fs.into_iter().map(f64::from).collect()),
        Nc::Ints(is) => AttributeValue::Numbers(is.into_iter().map(f64::from).collect()),
        Nc::Shorts(ss) => AttributeValue::Numbers(ss.into_iter().map(f64::from).collect()),
        _ => return None,
    };
    Some(converted)
}

/// Mask fill / missing values and apply the packing transform.
fn decode(raw: &[f64], attributes: &Attributes) -> Vec<f64> {
    let number = |key: &str| attributes.get(key).and_then(AttributeValue::as_f64);
    let fill = number("_FillValue");
    let missing = number("missing_value");
    let scale = number("scale_factor").unwrap_or(1.0);
    let offset = number("add_offset").unwrap_or(0.0);

    raw.iter()
        .map(|&v| {
            if !is_valid(v) || Some(v) == fill || Some(v) == missing {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_masks_and_scales() {
        let mut attrs = Attributes::new();
        attrs.insert("_FillValue".into(), AttributeValue::Number(-999.0));
        attrs.insert("scale_factor".into(), AttributeValue::Number(0.5));
        attrs.insert("add_offset".into(), AttributeValue::Number(10.0));

        let out = decode(&[2.0, -999.0, 9.969_209_968_386_869e36], &attrs);
        assert_eq!(out[0], 11.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }
}
