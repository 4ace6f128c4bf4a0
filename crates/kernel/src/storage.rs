//! Field storage keyed by field number.
//!
//! Field numbers below the pivot live in a dense slot vector indexed by field
//! number; everything else goes into an ordered map. Both halves iterate in
//! ascending field-number order, and every map key is at least the pivot, so
//! chaining them yields one sorted walk.

use std::collections::BTreeMap;

use crate::field::Field;

/// Default threshold between slot and map storage.
pub const DEFAULT_PIVOT: usize = 24;

#[derive(Debug, Clone)]
pub(crate) struct Storage {
    pivot: usize,
    array: Vec<Option<Field>>,
    map: BTreeMap<u32, Field>,
}

impl Storage {
    pub(crate) fn new(pivot: usize) -> Self {
        Self {
            pivot,
            array: Vec::new(),
            map: BTreeMap::new(),
        }
    }

    pub(crate) fn pivot(&self) -> usize {
        self.pivot
    }

    fn in_array(&self, field_number: u32) -> bool {
        (field_number as usize) < self.pivot
    }

    pub(crate) fn get(&self, field_number: u32) -> Option<&Field> {
        if self.in_array(field_number) {
            self.array.get(field_number as usize)?.as_ref()
        } else {
            self.map.get(&field_number)
        }
    }

    pub(crate) fn get_mut(&mut self, field_number: u32) -> Option<&mut Field> {
        if self.in_array(field_number) {
            self.array.get_mut(field_number as usize)?.as_mut()
        } else {
            self.map.get_mut(&field_number)
        }
    }

    /// Returns the field, inserting an empty one when absent.
    pub(crate) fn entry(&mut self, field_number: u32) -> &mut Field {
        if self.in_array(field_number) {
            let index = field_number as usize;
            if self.array.len() <= index {
                self.array.resize_with(index + 1, || None);
            }
            self.array[index].get_or_insert_with(Field::default)
        } else {
            self.map.entry(field_number).or_default()
        }
    }

    pub(crate) fn set(&mut self, field_number: u32, field: Field) {
        *self.entry(field_number) = field;
    }

    pub(crate) fn delete(&mut self, field_number: u32) {
        if self.in_array(field_number) {
            if let Some(slot) = self.array.get_mut(field_number as usize) {
                *slot = None;
            }
        } else {
            self.map.remove(&field_number);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &Field)> {
        let slots = self
            .array
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|field| (index as u32, field)));
        slots.chain(self.map.iter().map(|(number, field)| (*number, field)))
    }

    pub(crate) fn len(&self) -> usize {
        self.array.iter().filter(|slot| slot.is_some()).count() + self.map.len()
    }
}
