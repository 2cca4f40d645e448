//! Nested records.

use super::{FieldSampler, Sampler};
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use synth_core::{insert_field, FieldMap, FieldSchema, SampledValue};

/// One field of a record: its name, flattening flag and sampler.
#[derive(Debug)]
pub struct BoundField {
    pub name: String,
    pub flat: bool,
    pub sampler: FieldSampler,
}

impl BoundField {
    /// Build a field below `parent`, on the stream `parent / name`.
    pub fn build(
        field: &FieldSchema,
        parent: &SeedNode,
        parent_path: &str,
    ) -> Result<Self, GeneratorError> {
        let path = format!("{parent_path}.{}", field.name);
        Ok(Self {
            name: field.name.clone(),
            flat: field.flat,
            sampler: FieldSampler::build(&field.generator, parent.child(field.name.as_str()), &path)?,
        })
    }
}

/// Fill `fields` in order into one map, merging flat object values.
pub fn sample_fields(
    fields: &mut [BoundField],
    index: u64,
) -> Result<FieldMap, GeneratorError> {
    let mut out = FieldMap::new();
    for field in fields.iter_mut() {
        let value = field.sampler.sample(index)?;
        insert_field(&mut out, &field.name, value, field.flat);
    }
    Ok(out)
}

#[derive(Debug)]
pub struct ObjectSampler {
    fields: Vec<BoundField>,
}

impl ObjectSampler {
    pub fn new(
        fields: &[FieldSchema],
        node: &SeedNode,
        path: &str,
    ) -> Result<Self, GeneratorError> {
        let fields = fields
            .iter()
            .map(|f| BoundField::build(f, node, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }
}

impl Sampler for ObjectSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::Object(sample_fields(&mut self.fields, index)?))
    }
}
