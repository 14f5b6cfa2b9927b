//! Top-level call objects

use crate::accessor::{AccessError, Node, Sequence};
use crate::descriptor::FieldDescriptor;
use crate::record::Record;
use crate::schema::ProgramDefinition;
use progcall_interface::{ParamValue, ProgramBinding};

/// Root of an object graph that can be passed to a remote program
///
/// `binding` names the program and its schema document; `None` means the
/// object was not declared as a program call and is rejected with a schema
/// error before any session is acquired.
pub trait RemoteProgram: Node {
    fn binding(&self) -> Option<ProgramBinding>;

    fn descriptors(&self) -> &[FieldDescriptor];
}

/// A dynamic [`Record`] paired with the definition that lays it out
#[derive(Debug, Clone)]
pub struct RecordCall {
    pub definition: ProgramDefinition,
    pub record: Record,
}

impl RecordCall {
    pub fn new(definition: ProgramDefinition, record: Record) -> Self {
        Self { definition, record }
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl RemoteProgram for RecordCall {
    fn binding(&self) -> Option<ProgramBinding> {
        if self.definition.program.is_empty() {
            None
        } else {
            Some(self.definition.binding())
        }
    }

    fn descriptors(&self) -> &[FieldDescriptor] {
        &self.definition.fields
    }
}

impl Node for RecordCall {
    fn value(&self, field: &str) -> Result<ParamValue, AccessError> {
        self.record.value(field)
    }

    fn set_value(&mut self, field: &str, value: ParamValue) -> Result<(), AccessError> {
        self.record.set_value(field, value)
    }

    fn child(&self, field: &str) -> Result<&dyn Node, AccessError> {
        self.record.child(field)
    }

    fn child_mut(&mut self, field: &str) -> Result<&mut dyn Node, AccessError> {
        self.record.child_mut(field)
    }

    fn sequence(&self, field: &str) -> Result<&dyn Sequence, AccessError> {
        self.record.sequence(field)
    }

    fn sequence_mut(&mut self, field: &str) -> Result<&mut dyn Sequence, AccessError> {
        self.record.sequence_mut(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Usage;
    use crate::record::Slot;

    fn definition(program: &str) -> ProgramDefinition {
        ProgramDefinition {
            program: program.to_string(),
            document: "schemas/pgm".to_string(),
            fields: vec![FieldDescriptor::scalar("count", "CNT", Usage::Input)],
        }
    }

    #[test]
    fn test_binding_requires_a_program_name() {
        let call = RecordCall::new(definition(""), Record::new());
        assert!(call.binding().is_none());

        let call = RecordCall::new(definition("PGM"), Record::new());
        assert_eq!(call.binding(), Some(ProgramBinding::new("PGM", "schemas/pgm")));
        assert_eq!(call.descriptors().len(), 1);
    }

    #[test]
    fn test_node_delegates_to_record() {
        let mut call = RecordCall::new(definition("PGM"), Record::new().with("count", 3));
        assert_eq!(call.value("count").unwrap(), ParamValue::Int(3));
        call.set_value("count", ParamValue::Int(4)).unwrap();
        assert_eq!(call.into_record().get("count"), Some(&Slot::from(4)));
    }
}
