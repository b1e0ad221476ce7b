use keyrules::{
    CompileError, Constraint, KeyrulesError, RequestContext, RuleFile, RuleSet, Verdict,
};

fn compile(src: &str) -> RuleSet {
    let file = RuleFile::from_source("10-test.keyrules", src)
        .unwrap()
        .expect("source declares rules");
    RuleSet::new(vec![file], "wheel")
}

fn alice() -> RequestContext {
    RequestContext::new("alice").group("users").local(true).active(true)
}

// --- Compilation edge cases ---

#[test]
fn no_policy_group_is_skipped() {
    let src = "[allow]\nActions=*\nResult=yes\n";
    assert!(RuleFile::from_source("a.keyrules", src).unwrap().is_none());
}

#[test]
fn key_before_first_group_reports_line() {
    let src = "# header\nRules=a\n[Policy]\n";
    let err = RuleFile::from_source("a.keyrules", src).unwrap_err();
    match err {
        KeyrulesError::Parse(e) => assert_eq!(e.line(), Some(2)),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn repeated_group_merges_and_last_key_wins() {
    let src = "\
[Policy]
Rules=r

[r]
Actions=org.example.a
Result=no

[r]
Result=yes
";
    let rules = compile(src);
    assert_eq!(rules.evaluate("org.example.a", &alice()), Verdict::Authorized);
}

#[test]
fn verdicts_are_case_insensitive() {
    let src = "[Policy]\nRules=r\n[r]\nActions=*\nResult=  AUTH_Admin_Keep \n";
    assert_eq!(
        compile(src).evaluate("org.example.a", &alice()),
        Verdict::AdministratorAuthenticationRequiredRetained
    );
}

#[test]
fn unknown_result_fails_file() {
    let src = "[Policy]\nRules=r\n[r]\nActions=*\nResult=unknown\n";
    assert!(matches!(
        RuleFile::from_source("a.keyrules", src),
        Err(KeyrulesError::Compile(CompileError::InvalidResult { .. }))
    ));
}

#[test]
fn bad_inverse_fails_even_with_valid_result() {
    let src = "[Policy]\nRules=r\n[r]\nActions=*\nResult=yes\nResultInverse=perhaps\n";
    assert!(RuleFile::from_source("a.keyrules", src).is_err());
}

#[test]
fn missing_admin_rule_group_fails() {
    let src = "[Policy]\nAdminRules=admins\n";
    assert!(matches!(
        RuleFile::from_source("a.keyrules", src),
        Err(KeyrulesError::Compile(CompileError::MissingRule { chain: "AdminRules", .. }))
    ));
}

#[test]
fn invalid_escape_fails_file() {
    let src = "[Policy]\nRules=r\n[r]\nActions=org\\qexample\n";
    assert!(RuleFile::from_source("a.keyrules", src).is_err());
}

#[test]
fn escaped_separator_stays_in_element() {
    let src = "[Policy]\nRules=r\n[r]\nActionContains=a\\;b\nResult=yes\n";
    let rules = compile(src);
    assert_eq!(rules.evaluate("x.a;b.y", &alice()), Verdict::Authorized);
    assert_eq!(rules.evaluate("x.a.y", &alice()), Verdict::Unknown);
}

// --- Matching edge cases ---

#[test]
fn empty_group_list_never_matches() {
    let src = "\
[Policy]
Rules=r
[r]
Actions=*
InUnixGroups=
Result=yes
ResultInverse=auth_self
";
    assert_eq!(
        compile(src).evaluate("org.example.a", &alice()),
        Verdict::AuthenticationRequired
    );
}

#[test]
fn empty_substring_matches_every_action() {
    let src = "[Policy]\nRules=r\n[r]\nActionContains=;\nResult=yes\n";
    assert_eq!(compile(src).evaluate("anything", &alice()), Verdict::Authorized);
}

#[test]
fn inactive_subject_takes_inverse() {
    let src = "\
[Policy]
Rules=active-only
[active-only]
Actions=org.example.a
SubjectActive=true
Result=yes
ResultInverse=no
";
    let rules = compile(src);
    let inactive = alice().active(false);
    assert_eq!(rules.evaluate("org.example.a", &inactive), Verdict::NotAuthorized);

    let report = rules.evaluate_detailed("org.example.a", &inactive);
    let decision = report.decision().unwrap();
    assert_eq!(decision.failed_constraint(), Some(Constraint::SubjectActive));
}

#[test]
fn netgroups_do_not_affect_checks() {
    let src = "\
[Policy]
Rules=r
[r]
Actions=*
InNetGroups=nobody-here
Result=yes
ResultInverse=no
";
    assert_eq!(compile(src).evaluate("org.example.a", &alice()), Verdict::Authorized);
}

#[test]
fn user_match_is_exact() {
    let src = "[Policy]\nRules=r\n[r]\nActions=*\nInUserNames=alic\nResult=yes\n";
    assert_eq!(compile(src).evaluate("org.example.a", &alice()), Verdict::Unknown);
}

#[test]
fn wheel_alias_follows_configured_group() {
    let src = "[Policy]\nRules=r\n[r]\nActions=*\nInUnixGroups=%sudo%\nResult=yes\n";
    let file = RuleFile::from_source("a.keyrules", src).unwrap().unwrap();
    let sudoer = RequestContext::new("bob").group("sudo");

    let wheel = RuleSet::new(vec![file.clone()], "wheel");
    let sudo = RuleSet::new(vec![file], "sudo");
    assert_eq!(wheel.evaluate("org.example.a", &sudoer), Verdict::Unknown);
    assert_eq!(sudo.evaluate("org.example.a", &sudoer), Verdict::Authorized);
}

#[test]
fn admin_rules_are_not_consulted_for_checks() {
    let src = "\
[Policy]
AdminRules=admins
[admins]
Actions=*
InUserNames=alice
Result=yes
";
    assert_eq!(compile(src).evaluate("org.example.a", &alice()), Verdict::Unknown);
}

#[test]
fn admin_harvest_drops_invalid_entries() {
    let src = "\
[Policy]
AdminRules=admins
[admins]
InUserNames=good;bad:name;-dash;
InUnixGroups=%sudo%
";
    let ids: Vec<String> = compile(src)
        .admin_identities()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(ids, vec!["unix-group:wheel", "unix-user:good"]);
}

#[test]
fn admin_harvest_all_invalid_falls_back_to_root() {
    let src = "[Policy]\nAdminRules=admins\n[admins]\nInUserNames=not valid\n";
    let ids: Vec<String> = compile(src)
        .admin_identities()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(ids, vec!["unix-user:root"]);
}
