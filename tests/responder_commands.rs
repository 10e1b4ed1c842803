use hc06_sim_lib::responder::tables::{BAUD_CODES, ROLE_CODES};
use hc06_sim_lib::responder::{dispatch, Reply, Variant};

fn reply(token: &str) -> Reply {
    dispatch(&Variant::Hc06.profile(), token)
}

#[test]
fn test_bare_at_is_ok() {
    assert_eq!(reply("AT"), Reply::Ok("OK".into()));
    assert_eq!(reply("AT").to_string(), "OK");
}

#[test]
fn test_known_baud_codes_acknowledge_rate() {
    for (code, rate) in BAUD_CODES {
        assert_eq!(reply(&format!("AT+BAUD{}", code)).to_string(), format!("OK{}", rate));
    }
}

#[test]
fn test_unknown_baud_codes_are_named() {
    for code in ["0", "D", "a", "99", "?"] {
        let reply = reply(&format!("AT+BAUD{}", code));
        assert_eq!(reply, Reply::UnknownBaud(code.to_string()));
        assert!(reply.to_string().contains(code));
    }
}

#[test]
fn test_roles() {
    for (code, role) in ROLE_CODES {
        assert_eq!(reply(&format!("AT+ROLE={}", code)).to_string(), format!("OK+ROLE:{}", role));
    }
    for code in ["X", "s", "SM", ""] {
        assert_eq!(reply(&format!("AT+ROLE={}", code)), Reply::BadRole(code.to_string()));
    }
}

#[test]
fn test_version_string_per_module() {
    let version = |variant: Variant| dispatch(&variant.profile(), "AT+VERSION").to_string();
    assert_eq!(version(Variant::Hc06), "HC06SimV1.0");
    assert_eq!(version(Variant::Linvor), "LinvorV1.8");
}

#[test]
fn test_name_suffix_is_ignored() {
    assert_eq!(reply("AT+NAMEfoo").to_string(), "OKname");
    assert_eq!(reply("AT+NAMEsomething much longer").to_string(), "OKname");
}

#[test]
fn test_unknown_command_echoes_token() {
    let reply = reply("XYZ");
    assert_eq!(reply, Reply::UnknownCommand("XYZ".into()));
    assert!(reply.to_string().ends_with("XYZ"));
    assert!(!reply.is_ok());
}

#[test]
fn test_replies_have_no_line_terminator() {
    for token in ["AT", "AT+VERSION", "AT+BAUD4", "AT+PO", "AT+FOO", "XYZ"] {
        let wire = reply(token).to_wire();
        assert!(!wire.ends_with(b"\n"), "{} reply ends with newline", token);
        assert!(!wire.ends_with(b"\r"), "{} reply ends with CR", token);
    }
}

#[test]
fn test_minimal_module_hard_wired_replies() {
    let minimal = Variant::Minimal.profile();
    for code in ["1", "8", "C", "nonsense"] {
        assert_eq!(dispatch(&minimal, &format!("AT+BAUD{}", code)).to_string(), "OK1200");
    }
    for parity in ["PO", "PE", "PN"] {
        assert_eq!(dispatch(&minimal, &format!("AT+{}", parity)).to_string(), "OK ODD");
    }
}
