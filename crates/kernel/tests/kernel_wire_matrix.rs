use proptest::prelude::*;
use proto_kernel::{Kernel, KernelError};

#[test]
fn scalar_wire_matrix() {
    let mut kernel = Kernel::new();
    kernel.set_int32(1, 150);
    kernel.set_bool(2, true);
    kernel.set_fixed32(3, 1);
    kernel.set_string(4, "hi");
    kernel.set_double(5, 1.5);
    let bytes = kernel.serialize();
    assert_eq!(
        bytes,
        vec![
            0x08, 0x96, 0x01, // field 1 varint 150
            0x10, 0x01, // field 2 varint 1
            0x1d, 0x01, 0x00, 0x00, 0x00, // field 3 fixed32
            0x22, 0x02, b'h', b'i', // field 4 delimited
            0x29, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x3f, // field 5 fixed64
        ]
    );

    let parsed = Kernel::from_bytes(&bytes).unwrap();
    assert_eq!(parsed.get_int32_with_default(1), Ok(150));
    assert_eq!(parsed.get_bool_with_default(2), Ok(true));
    assert_eq!(parsed.get_fixed32_with_default(3), Ok(1));
    assert_eq!(parsed.get_string_with_default(4), Ok("hi".to_string()));
    assert_eq!(parsed.get_double_with_default(5), Ok(1.5));
    assert_eq!(parsed.serialize(), bytes);
}

#[test]
fn unread_groups_reserialize_verbatim() {
    let bytes = vec![0x0b, 0x10, 0xb9, 0x60, 0x1a, 0x01, 0x00, 0x0c, 0x50, 0x01];
    let kernel = Kernel::from_bytes(&bytes).unwrap();
    assert_eq!(kernel.serialize(), bytes);
}

#[test]
fn nested_payload_errors_surface_on_read() {
    // field 3 holds a delimited payload whose inner tag is truncated
    let kernel = Kernel::from_bytes(&[0x1a, 0x01, 0x80]).unwrap();
    assert!(kernel.has_field_number(3));
    assert!(matches!(
        kernel.get_message(3, |k| k, None),
        Err(KernelError::Buffer(_))
    ));
}

#[test]
fn clear_field_removes_all_occurrences() {
    let mut kernel = Kernel::from_bytes(&[0x08, 0x01, 0x08, 0x02, 0x10, 0x03]).unwrap();
    kernel.clear_field(1);
    assert!(!kernel.has_field_number(1));
    assert_eq!(kernel.serialize(), [0x10, 0x03]);
}

#[test]
fn deep_group_nesting_fails_without_overflow() {
    assert_eq!(
        Kernel::from_bytes(&vec![0x0b; 200_000]).unwrap_err(),
        KernelError::UnterminatedGroup(1)
    );

    // the same nesting, one level down inside a delimited field
    let mut nested = vec![0x0b; 200_000];
    nested.extend(std::iter::repeat(0x0c).take(200_000 - 1));
    let mut outer = Kernel::new();
    outer.set_bytes(2, &nested);
    let parsed = Kernel::from_bytes(&outer.serialize()).unwrap();
    assert_eq!(
        parsed.get_message(2, |k| k, None).unwrap_err(),
        KernelError::UnterminatedGroup(1)
    );
}

proptest! {
    #[test]
    fn pivot_never_changes_serialized_bytes(
        fields in prop::collection::btree_map(1u32..200, any::<i64>(), 0..16),
        pivot in 0usize..64,
    ) {
        let mut dense = Kernel::with_pivot(pivot);
        let mut sparse = Kernel::with_pivot(0);
        for (number, value) in &fields {
            dense.set_int64(*number, *value);
            sparse.set_int64(*number, *value);
        }
        let bytes = dense.serialize();
        prop_assert_eq!(&bytes, &sparse.serialize());

        let parsed = Kernel::from_bytes_with_pivot(&bytes, pivot).unwrap();
        for (number, value) in &fields {
            prop_assert_eq!(parsed.get_int64_with_default(*number), Ok(*value));
        }
    }

    #[test]
    fn int32_round_trips(value in any::<i32>()) {
        let mut kernel = Kernel::new();
        kernel.set_int32(7, value);
        let parsed = Kernel::from_bytes(&kernel.serialize()).unwrap();
        prop_assert_eq!(parsed.get_int32_with_default(7), Ok(value));
    }
}
