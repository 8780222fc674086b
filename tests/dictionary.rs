//! Grammar and registry tests: directive parsing, scoping, includes and the
//! extension dictionary merge.

use raddict::parser::{BUILTIN_EXTENSION, EXTENSION_DICTIONARY, ROOT_DICTIONARY};
use raddict::{parse_line, Directive, DictionaryParser, ParseError, ParseOptions, Registry};
use std::path::Path;

fn no_extension() -> ParseOptions {
    ParseOptions {
        extension: false,
        ..ParseOptions::default()
    }
}

fn parse(source: &str) -> Registry {
    let mut parser = DictionaryParser::new(".", no_extension());
    parser.parse_str(source).expect("parse");
    parser.finish()
}

fn write(dir: &Path, file: &str, text: &str) {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, text).expect("write");
}

const VENDOR_DICT: &str = "\
# Acme Inc.
VENDOR\tAcme\t9\tformat=2,1
BEGIN-VENDOR\tAcme
ATTRIBUTE\tAcme-Code\t1\tinteger
ATTRIBUTE\tAcme-Group\t5\ttlv
BEGIN-TLV\tAcme-Group
ATTRIBUTE\tAcme-Member\t2\tbyte
END-TLV\tAcme-Group
VALUE\tAcme-Code\tRed\t1
VALUE\tAcme-Code\tBlue\t0x02
END-VENDOR\tAcme
";

#[test]
fn test_keywords_are_case_insensitive() {
    assert!(matches!(parse_line("vendor Acme 9"), Ok(Some(Directive::Vendor(_)))));
    assert!(matches!(parse_line("Begin-Vendor Acme"), Ok(Some(Directive::BeginVendor(_)))));
    assert!(matches!(parse_line("value A B 1"), Ok(Some(Directive::Value(_)))));
    assert!(matches!(parse_line("\t  ATTRIBUTE A 1 string  "), Ok(Some(Directive::Attribute(_)))));
}

#[test]
fn test_vendor_scope_and_tlv() {
    let reg = parse(VENDOR_DICT);
    assert!(reg.attributes.is_empty());
    let acme = reg.vendor("Acme").expect("vendor");
    assert_eq!(acme.number, 9);
    assert_eq!(acme.format(), Some("2,1"));
    assert_eq!(acme.namespace.to_string(), "vsa_acme");
    let names: Vec<_> = acme.attributes.keys().cloned().collect();
    assert_eq!(names, vec!["Acme-Code", "Acme-Group"]);

    let group = &acme.attributes["Acme-Group"];
    assert!(group.has_sub_attributes());
    let member = &group.sub_attributes.as_ref().expect("children")["Acme-Member"];
    assert_eq!(member.number, 2);
    assert_eq!(member.vendor.as_deref(), Some("Acme"));

    let values = acme.attributes["Acme-Code"].values.as_ref().expect("values");
    assert_eq!(values[&1i64].names, vec!["Red"]);
    assert_eq!(values[&2i64].names, vec!["Blue"]);
    assert_eq!(reg.attribute_count(), 3);
}

#[test]
fn test_first_definition_wins_case_insensitive() {
    let reg = parse(
        "VENDOR Acme 9\n\
         ATTRIBUTE User-Name 1 string\n\
         ATTRIBUTE user-name 99 integer\n\
         ATTRIBUTE USER-NAME 7 string Acme\n",
    );
    assert_eq!(reg.attributes.len(), 1);
    assert_eq!(reg.attributes["User-Name"].number, 1);
    assert!(reg.vendors["Acme"].attributes.is_empty());
    assert_eq!(reg.find_attribute("USER-name").map(|a| a.number), Some(1));
}

#[test]
fn test_value_resolution() {
    let reg = parse(
        "VENDOR Acme 9\n\
         ATTRIBUTE Service-Type 6 integer\n\
         ATTRIBUTE Acme-Mode 3 integer Acme\n\
         VALUE Service-Type Login-User 1\n\
         VALUE Service-Type Login 1\n\
         VALUE Service-Type Login-User 1\n\
         VALUE Acme-Mode Outside 1\n\
         BEGIN-VENDOR Acme\n\
         VALUE Acme-Mode Inside 2\n\
         VALUE Service-Type Framed-User 2\n\
         END-VENDOR Acme\n\
         VALUE No-Such-Attribute Foo 1\n",
    );
    let service = reg.attributes["Service-Type"].values.as_ref().expect("values");
    assert_eq!(service[&1i64].names, vec!["Login-User", "Login"]);
    assert_eq!(service[&1i64].canonical_name(), Some("Login"));
    assert_eq!(service[&2i64].names, vec!["Framed-User"]);

    // Vendor attributes are only reachable while their vendor scope is open.
    let mode = reg.vendors["Acme"].attributes["Acme-Mode"].values.as_ref().expect("values");
    assert_eq!(mode.len(), 1);
    assert_eq!(mode[&2i64].names, vec!["Inside"]);
}

#[test]
fn test_malformed_lines_are_ignored() {
    let reg = parse(
        "ATTRIBUTE Short 1\n\
         ATTRIBUTE Bad-Number one string\n\
         FLAGS internal\n\
         PROTOCOL RADIUS 1\n\
         VENDOR Bad xyz\n\
         ATTRIBUTE Good 0x1F string\n",
    );
    assert_eq!(reg.attributes.len(), 1);
    assert_eq!(reg.attributes["Good"].number, 31);
    assert!(reg.vendors.is_empty());
}

#[test]
fn test_redeclared_vendor_keeps_attributes() {
    let reg = parse("VENDOR Acme 9\nATTRIBUTE A-1 1 string Acme\nVENDOR Acme 10\n");
    let acme = &reg.vendors["Acme"];
    assert_eq!(acme.number, 10);
    assert!(acme.attributes.contains_key("A-1"));
}

#[test]
fn test_undeclared_vendor_scope_falls_back_to_top_level() {
    let reg = parse("BEGIN-VENDOR Ghost\nATTRIBUTE Lost 1 string\nEND-VENDOR Ghost\n");
    assert!(reg.attributes.contains_key("Lost"));
    assert_eq!(reg.attributes["Lost"].vendor, None);
}

#[test]
fn test_includes_resolve_against_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "$INCLUDE sub/dictionary.acme\nATTRIBUTE After 2 string\n");
    write(dir.path(), "sub/dictionary.acme", &format!("{}$INCLUDE dictionary.more\n", VENDOR_DICT));
    write(dir.path(), "dictionary.more", "ATTRIBUTE More 3 string\n");

    let reg = DictionaryParser::load(dir.path(), no_extension()).expect("load");
    assert!(reg.vendors.contains_key("Acme"));
    let names: Vec<_> = reg.attributes.keys().cloned().collect();
    assert_eq!(names, vec!["More", "After"]);
}

#[test]
fn test_include_cycle_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "$INCLUDE dictionary.a\nATTRIBUTE Root 1 string\n");
    write(dir.path(), "dictionary.a", "$INCLUDE dictionary\nATTRIBUTE A 2 string\n");

    let reg = DictionaryParser::load(dir.path(), no_extension()).expect("load");
    assert_eq!(reg.attributes.len(), 2);
}

#[test]
fn test_missing_include() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "$INCLUDE dictionary.missing\nATTRIBUTE Root 1 string\n");

    let reg = DictionaryParser::load(dir.path(), no_extension()).expect("lenient load");
    assert!(reg.attributes.contains_key("Root"));

    let strict = ParseOptions {
        strict_includes: true,
        ..no_extension()
    };
    match DictionaryParser::load(dir.path(), strict) {
        Err(ParseError::Include { file, .. }) => assert_eq!(file, "dictionary.missing"),
        other => panic!("expected include error, got {:?}", other),
    }
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        DictionaryParser::load(dir.path(), ParseOptions::default()),
        Err(ParseError::Io(_))
    ));
}

#[test]
fn test_builtin_extension_merged_when_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "ATTRIBUTE User-Name 1 string\n");

    let reg = DictionaryParser::load(dir.path(), ParseOptions::default()).expect("load");
    let jradius = reg.vendor("JRadius").expect("extension vendor");
    assert_eq!(jradius.number, 19211);
    let names: Vec<_> = jradius.attributes.keys().cloned().collect();
    assert_eq!(names, vec!["JRadius-Request-Id", "JRadius-Session-Id", "JRadius-Proxy-Client"]);
    assert_eq!(jradius.attributes["JRadius-Proxy-Client"].type_tag, "octets");
    assert!(BUILTIN_EXTENSION.starts_with("VENDOR"));
}

#[test]
fn test_extension_file_preferred_over_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "ATTRIBUTE User-Name 1 string\n");
    write(
        dir.path(),
        EXTENSION_DICTIONARY,
        "VENDOR JRadius 19211\nATTRIBUTE JRadius-Custom 10 string JRadius\n",
    );

    let reg = DictionaryParser::load(dir.path(), ParseOptions::default()).expect("load");
    let jradius = reg.vendor("JRadius").expect("extension vendor");
    assert_eq!(jradius.attributes.len(), 1);
    assert!(jradius.attributes.contains_key("JRadius-Custom"));
}

#[test]
fn test_included_extension_is_not_merged_twice() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        ROOT_DICTIONARY,
        &format!("$INCLUDE {}\nATTRIBUTE User-Name 1 string\n", EXTENSION_DICTIONARY),
    );
    write(dir.path(), EXTENSION_DICTIONARY, "VENDOR JRadius 19211\n");

    let reg = DictionaryParser::load(dir.path(), ParseOptions::default()).expect("load");
    assert!(reg.vendor("JRadius").expect("vendor").attributes.is_empty());
}

#[test]
fn test_extension_can_be_disabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ROOT_DICTIONARY, "ATTRIBUTE User-Name 1 string\n");
    let reg = DictionaryParser::load(dir.path(), no_extension()).expect("load");
    assert!(reg.vendor("JRadius").is_none());
}

#[test]
fn test_scope_directives_ignore_trailing_tokens() {
    let reg = parse(
        "VENDOR\tWiMAX\t24757\tformat=1,1,c\n\
         BEGIN-VENDOR\tWiMAX\tformat=1,1,c\n\
         ATTRIBUTE\tWiMAX-Capability\t1\ttlv\n\
         BEGIN-TLV\tWiMAX-Capability\tignored\n\
         ATTRIBUTE\tWiMAX-Release\t1\tstring\n\
         END-TLV\tWiMAX-Capability\tignored\n\
         END-VENDOR\tWiMAX\tformat=1,1,c\n\
         ATTRIBUTE\tAfter\t2\tstring\n",
    );
    assert_eq!(reg.attributes.keys().collect::<Vec<_>>(), vec!["After"]);
    let wimax = reg.vendor("WiMAX").expect("vendor");
    assert_eq!(wimax.format(), Some("1,1,c"));
    let capability = &wimax.attributes["WiMAX-Capability"];
    assert_eq!(capability.vendor.as_deref(), Some("WiMAX"));
    assert!(capability.sub_attributes.as_ref().expect("children").contains_key("WiMAX-Release"));

    assert_eq!(
        parse_line("BEGIN-VENDOR WiMAX format=1,1,c"),
        Ok(Some(Directive::BeginVendor("WiMAX".into())))
    );
    assert_eq!(parse_line("END-VENDOR"), Ok(Some(Directive::EndVendor(None))));
}

#[test]
fn test_optional_include() {
    assert_eq!(
        parse_line("$INCLUDE- dictionary.local"),
        Ok(Some(Directive::Include {
            path: "dictionary.local".into(),
            optional: true,
        }))
    );
    assert!(parse_line("$INCLUDEX dictionary.local").is_err());

    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        ROOT_DICTIONARY,
        "$INCLUDE- dictionary.absent\n$INCLUDE- dictionary.local\nATTRIBUTE Root 1 string\n",
    );
    write(dir.path(), "dictionary.local", "ATTRIBUTE Local 2 string\n");

    // A missing optional include is not an error, even in strict mode.
    let strict = ParseOptions {
        strict_includes: true,
        ..no_extension()
    };
    let reg = DictionaryParser::load(dir.path(), strict).expect("load");
    let names: Vec<_> = reg.attributes.keys().cloned().collect();
    assert_eq!(names, vec!["Local", "Root"]);
}

#[test]
fn test_oversized_tlv_child_number_is_dropped() {
    let reg = parse(
        "ATTRIBUTE Outer 241 tlv\n\
         BEGIN-TLV Outer\n\
         ATTRIBUTE Huge 0x1000000 integer\n\
         ATTRIBUTE Largest 0xFFFFFF integer\n\
         END-TLV Outer\n\
         ATTRIBUTE Huge 7 integer\n",
    );
    let children = reg.attributes["Outer"].sub_attributes.as_ref().expect("children");
    assert_eq!(children.keys().collect::<Vec<_>>(), vec!["Largest"]);
    // The dropped line does not claim the name.
    assert_eq!(reg.attributes["Huge"].number, 7);
}
