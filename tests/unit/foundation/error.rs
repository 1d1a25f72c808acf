use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VgirError::ownership("x")
            .to_string()
            .contains("ownership error:")
    );
    assert!(
        VgirError::assembler("x")
            .to_string()
            .contains("assembler error:")
    );
    assert!(
        VgirError::invalid_state("x")
            .to_string()
            .contains("invalid state:")
    );
    assert!(
        VgirError::argument("x")
            .to_string()
            .contains("argument error:")
    );
    assert!(
        VgirError::not_implemented("x")
            .to_string()
            .contains("not implemented:")
    );
    assert!(VgirError::decode("x").to_string().contains("decode error:"));
}

#[test]
fn null_reference_names_the_type() {
    let err = VgirError::null_reference("shader");
    assert!(err.to_string().contains("`shader`"));
    assert!(matches!(
        err,
        VgirError::NullReference {
            type_name: "shader"
        }
    ));
}

#[test]
fn invalid_index_reports_slot() {
    assert!(VgirError::InvalidIndex(17).to_string().contains("17"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VgirError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
