use keyrules::parse::parse;
use keyrules::{Chain, RequestContext, Rule, RuleFile, RuleSet, RuleSetBuilder, Verdict};

const DESKTOP: &str = r"
# Desktop defaults: local active users may mount, wheel may do power
# management, everybody else authenticates as administrator.

[Policy]
Rules=mount-local;power-wheel;
AdminRules=admins

[mount-local]
ActionContains=udisks2.filesystem-mount
SubjectLocal=true
SubjectActive=true
Result=yes
ResultInverse=auth_admin_keep

[power-wheel]
Actions=org.freedesktop.login1.reboot;org.freedesktop.login1.power-off
InUnixGroups=%sudo%
Result=yes
ResultInverse=auth_admin

[admins]
InUnixGroups=%sudo%;adm
InUserNames=root
";

fn desktop() -> RuleSet {
    let file = RuleFile::from_source("50-desktop.keyrules", DESKTOP)
        .unwrap()
        .unwrap();
    RuleSet::new(vec![file], "wheel")
}

#[test]
fn keyfile_parse_and_evaluate() {
    let rules = desktop();
    let seat_user = RequestContext::new("alice").local(true).active(true);
    assert_eq!(
        rules.evaluate("org.freedesktop.udisks2.filesystem-mount", &seat_user),
        Verdict::Authorized
    );
}

#[test]
fn remote_user_gets_inverse() {
    let rules = desktop();
    let remote = RequestContext::new("alice").local(false).active(true);
    assert_eq!(
        rules.evaluate("org.freedesktop.udisks2.filesystem-mount-system", &remote),
        Verdict::AdministratorAuthenticationRequiredRetained
    );
}

#[test]
fn wheel_member_can_reboot() {
    let rules = desktop();
    let admin = RequestContext::new("bob").groups(["users", "wheel"]);
    let guest = RequestContext::new("guest").group("users");
    assert_eq!(rules.evaluate("org.freedesktop.login1.reboot", &admin), Verdict::Authorized);
    assert_eq!(
        rules.evaluate("org.freedesktop.login1.power-off", &guest),
        Verdict::AdministratorAuthenticationRequired
    );
}

#[test]
fn unrelated_action_is_unknown() {
    let rules = desktop();
    let admin = RequestContext::new("bob").group("wheel");
    assert_eq!(rules.evaluate("org.freedesktop.NetworkManager.wifi", &admin), Verdict::Unknown);
}

#[test]
fn admin_identities_from_keyfile() {
    let ids: Vec<String> = desktop()
        .admin_identities()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(ids, vec!["unix-group:wheel", "unix-group:adm", "unix-user:root"]);
}

#[test]
fn keyfile_matches_builder() {
    let from_source = desktop();
    let built = RuleSetBuilder::new()
        .file("50-desktop.keyrules", |f| {
            f.rule(
                Rule::new("mount-local")
                    .action_contains(["udisks2.filesystem-mount"])
                    .subject_local(true)
                    .subject_active(true)
                    .result(Verdict::Authorized)
                    .result_inverse(Verdict::AdministratorAuthenticationRequiredRetained),
            )
            .rule(
                Rule::new("power-wheel")
                    .actions([
                        "org.freedesktop.login1.reboot",
                        "org.freedesktop.login1.power-off",
                    ])
                    .unix_groups(["%sudo%"])
                    .result(Verdict::Authorized)
                    .result_inverse(Verdict::AdministratorAuthenticationRequired),
            )
            .admin_rule(
                Rule::new("admins")
                    .unix_groups(["%sudo%", "adm"])
                    .user_names(["root"]),
            )
        })
        .wheel_group("wheel")
        .build();
    assert_eq!(from_source, built);
}

#[test]
fn raw_keyfile_access() {
    let keyfile = parse(DESKTOP).unwrap();
    let groups: Vec<&str> = keyfile.groups().collect();
    assert_eq!(groups, vec!["Policy", "mount-local", "power-wheel", "admins"]);
    assert_eq!(
        keyfile.string_list("Policy", Chain::Normal.key()).unwrap(),
        Some(vec!["mount-local".to_owned(), "power-wheel".to_owned()])
    );
    assert_eq!(keyfile.boolean("mount-local", "SubjectLocal").unwrap(), Some(true));
    assert_eq!(keyfile.string("power-wheel", "Result").unwrap().as_deref(), Some("yes"));
    assert!(!keyfile.has_key("admins", "Result"));
}

#[test]
fn parse_error_names_line() {
    let err = parse("[Policy]\nRules=a\nthis line is junk\n").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(err.to_string().starts_with("parse error on line 3"));
}

#[test]
fn value_with_escapes() {
    let keyfile = parse("[g]\nname=\\sleading and\\ttab\n").unwrap();
    assert_eq!(
        keyfile.string("g", "name").unwrap().as_deref(),
        Some(" leading and\ttab")
    );
}
