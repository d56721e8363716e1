use crate::{
    instructions::{Vector4, Vector8},
    tables::LookupTables,
};

/// Used to receive set intersection results in a generic way. Inspired by
/// roaring-rs.
pub trait Visitor<T> {
    fn visit(&mut self, value: T);
}

/// Receives whole blocks of matches from the vector kernels.
pub trait BlockVisitor: Visitor<u32> {
    /// Receives consecutive matches in ascending order.
    #[inline]
    fn visit_packed(&mut self, values: &[u32]) {
        for &value in values {
            self.visit(value);
        }
    }

    /// Receives the lanes of `value` selected by `mask`.
    ///
    /// # Safety
    /// `W` must be supported by the running CPU.
    #[inline(always)]
    unsafe fn visit_vector4<W: Vector4>(&mut self, tables: &LookupTables, value: W, mask: u8) {
        if mask == 0 {
            return;
        }
        let mut packed = [0u32; 4];
        value.shuffle_bytes(tables.compact4(mask)).store(&mut packed);
        self.visit_packed(&packed[..mask.count_ones() as usize]);
    }

    /// # Safety
    /// `W` must be supported by the running CPU.
    #[inline(always)]
    unsafe fn visit_vector8<W: Vector8>(&mut self, tables: &LookupTables, value: W, mask: u8) {
        if mask == 0 {
            return;
        }
        let mut packed = [0u32; 8];
        value.permute(tables.compact8(mask)).store(&mut packed);
        self.visit_packed(&packed[..mask.count_ones() as usize]);
    }
}

/// Counts intersection size without storing result.
#[derive(Debug, Default)]
pub struct Counter {
    count: usize,
}

impl Counter {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<T> Visitor<T> for Counter {
    #[inline]
    fn visit(&mut self, _value: T) {
        self.count += 1;
    }
}

impl BlockVisitor for Counter {
    #[inline]
    fn visit_packed(&mut self, values: &[u32]) {
        self.count += values.len();
    }

    #[inline(always)]
    unsafe fn visit_vector4<W: Vector4>(&mut self, _tables: &LookupTables, _value: W, mask: u8) {
        self.count += mask.count_ones() as usize;
    }

    #[inline(always)]
    unsafe fn visit_vector8<W: Vector8>(&mut self, _tables: &LookupTables, _value: W, mask: u8) {
        self.count += mask.count_ones() as usize;
    }
}

/// Stores intersection result in a vector.
#[derive(Debug)]
pub struct VecWriter<T> {
    items: Vec<T>,
}

impl<T> VecWriter<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(cardinality: usize) -> Self {
        Self {
            items: Vec::with_capacity(cardinality),
        }
    }
}

impl<T> AsRef<[T]> for VecWriter<T> {
    fn as_ref(&self) -> &[T] {
        &self.items
    }
}

/// Appends to an existing vector.
impl<T> From<Vec<T>> for VecWriter<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> From<VecWriter<T>> for Vec<T> {
    fn from(value: VecWriter<T>) -> Self {
        value.items
    }
}

impl<T> Default for VecWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Visitor<T> for VecWriter<T> {
    #[inline]
    fn visit(&mut self, value: T) {
        self.items.push(value);
    }
}

impl BlockVisitor for VecWriter<u32> {
    #[inline]
    fn visit_packed(&mut self, values: &[u32]) {
        self.items.extend_from_slice(values);
    }
}

/// Writes intersection result to provided array slice. Panics if the slice is
/// shorter than the result.
pub struct SliceWriter<'a, T> {
    data: &'a mut [T],
    position: usize,
}

impl<'a, T> SliceWriter<'a, T> {
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a, T> From<&'a mut [T]> for SliceWriter<'a, T> {
    fn from(data: &'a mut [T]) -> Self {
        Self { data, position: 0 }
    }
}

impl<'a, T> Visitor<T> for SliceWriter<'a, T> {
    #[inline]
    fn visit(&mut self, value: T) {
        self.data[self.position] = value;
        self.position += 1;
    }
}

impl<'a> BlockVisitor for SliceWriter<'a, u32> {
    #[inline]
    fn visit_packed(&mut self, values: &[u32]) {
        let end = self.position + values.len();
        self.data[self.position..end].copy_from_slice(values);
        self.position = end;
    }
}

/// Ensures all visits match expected output.
/// Used for testing algorithm correctness.
pub struct EnsureVisitor<'a, T>
where
    T: PartialEq,
{
    expected: &'a [T],
    position: usize,
}

impl<'a, T> EnsureVisitor<'a, T>
where
    T: PartialEq,
{
    pub fn position(&self) -> usize {
        self.position
    }

    /// True when every expected value has been visited.
    pub fn is_complete(&self) -> bool {
        self.position == self.expected.len()
    }
}

impl<'a, T> From<&'a [T]> for EnsureVisitor<'a, T>
where
    T: PartialEq,
{
    fn from(expected: &'a [T]) -> Self {
        Self {
            expected,
            position: 0,
        }
    }
}

impl<'a, T> Visitor<T> for EnsureVisitor<'a, T>
where
    T: PartialEq + std::fmt::Debug,
{
    fn visit(&mut self, value: T) {
        assert_eq!(value, self.expected[self.position]);
        self.position += 1;
    }
}

impl<'a> BlockVisitor for EnsureVisitor<'a, u32> {
    fn visit_packed(&mut self, values: &[u32]) {
        let end = self.position + values.len();
        assert_eq!(values, &self.expected[self.position..end]);
        self.position = end;
    }
}
