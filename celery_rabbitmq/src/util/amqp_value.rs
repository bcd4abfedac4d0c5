use lapin::types::AMQPValue;

/// Artificial trait implemented for [`AMQPValue`] to allow reporting whether it
/// can be considered empty.
pub trait IsEmpty {
    /// Reports whether this [`AMQPValue`] may be considered empty (which most
    /// likely means an empty string). Note that numerical zero values are
    /// **not** empty. Empty collections, however, are empty.
    fn is_empty(&self) -> bool;
}

impl IsEmpty for AMQPValue {
    fn is_empty(&self) -> bool {
        match self {
            AMQPValue::ShortString(s) => s.as_str().is_empty(),
            AMQPValue::LongString(s) => s.as_bytes().is_empty(),
            AMQPValue::FieldArray(a) => a.as_slice().is_empty(),
            AMQPValue::FieldTable(t) => t.inner().is_empty(),
            AMQPValue::ByteArray(a) => a.as_slice().is_empty(),
            AMQPValue::Void => true,
            _ => false,
        }
    }
}
