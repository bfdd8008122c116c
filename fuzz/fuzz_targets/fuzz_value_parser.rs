#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_lab::value::{TypeTag, Value};

const TAGS: [TypeTag; 6] = [
    TypeTag::Integer,
    TypeTag::OctetString,
    TypeTag::ObjectIdentifier,
    TypeTag::Counter32,
    TypeTag::Gauge32,
    TypeTag::TimeTicks,
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let tag = TAGS[selector as usize % TAGS.len()];

    // A parsed value always carries the tag it was parsed as.
    if let Ok(value) = Value::parse_as(tag, text) {
        assert_eq!(value.type_tag(), Some(tag));
    }
    let _ = text.parse::<TypeTag>();
});
