#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_lab::mib::resolve_name;
use snmp_lab::oid::Oid;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Dotted notation must round-trip through Display.
    if let Ok(oid) = Oid::parse(s) {
        let reparsed = Oid::parse(&oid.to_string()).expect("displayed OID must parse");
        assert_eq!(oid, reparsed);
    }

    let _ = resolve_name(s);
});
