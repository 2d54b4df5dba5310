//! End-to-end tests over tempdir reactors

use pommel::{
    parser, writer, Engine, Reactor, RuleRegistry, Rules, RulesCache, TextFormatter,
    OutputFormatter,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn write_pom(dir: &Path, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("pom.xml"), content).unwrap();
}

fn empty_cache() -> RulesCache {
    RulesCache::new(Box::new(|_| Ok(Rules::new())))
}

fn engine(active: &[&str]) -> Engine {
    let ids: Vec<String> = active.iter().map(|s| s.to_string()).collect();
    Engine::new(RuleRegistry::builtin()).with_active(&ids)
}

#[test]
fn test_unused_property_reported_at_declaration_line() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <project>\n\
         \x20   <groupId>com.example</groupId>\n\
         \x20   <artifactId>app</artifactId>\n\
         \x20   <version>1.0</version>\n\
         \x20   <properties>\n\
         \x20       <foo>1.0</foo>\n\
         \x20   </properties>\n\
         </project>\n",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let report = engine(&["unused-properties"])
        .check(&reactor, &empty_cache())
        .unwrap();

    let violations = report.ledger.violations_for(Path::new("pom.xml")).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_id, "unused-properties");
    assert_eq!(violations[0].line, 7);
    assert!(violations[0].message.contains("foo"));
}

#[test]
fn test_duplicate_managed_dependency_reported_at_second_occurrence() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <project>\n\
         \x20   <groupId>com.example</groupId>\n\
         \x20   <version>1.0</version>\n\
         \x20   <dependencyManagement>\n\
         \x20       <dependencies>\n\
         \x20           <dependency>\n\
         \x20               <groupId>g</groupId>\n\
         \x20               <artifactId>a</artifactId>\n\
         \x20           </dependency>\n\
         \x20           <dependency>\n\
         \x20               <groupId>g</groupId>\n\
         \x20               <artifactId>a</artifactId>\n\
         \x20           </dependency>\n\
         \x20       </dependencies>\n\
         \x20   </dependencyManagement>\n\
         </project>\n",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let report = engine(&["duplicate-dependencies"])
        .check(&reactor, &empty_cache())
        .unwrap();

    let violations = report.ledger.violations_for(Path::new("pom.xml")).unwrap();
    assert_eq!(violations.len(), 1);
    // The second occurrence's line is referenced
    assert_eq!(violations[0].line, 11);
}

#[test]
fn test_comment_and_child_parsed_in_document_order() {
    let doc = parser::parse_str("<root><!--hi--><child/></root>", Path::new("pom.xml")).unwrap();
    let root = doc.root();
    let children = doc.children(root);

    assert_eq!(doc.name(root), "root");
    assert_eq!(children.len(), 2);
    assert_eq!(doc.text(children[0]), Some("hi"));
    assert_eq!(doc.name(children[1]), "child");

    let comment = doc.position(children[0]);
    let child = doc.position(children[1]);
    assert!(!comment.is_synthetic());
    assert!(!child.is_synthetic());
    assert!((comment.end_line, comment.end_col) <= (child.start_line, child.start_col));
    assert!(doc.position(root).contains(&comment));
    assert!(doc.position(root).contains(&child));
}

#[test]
fn test_round_trip_preserves_structure_and_text() {
    let content = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <!-- license header -->\n\
        <project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n\
        \x20   <groupId>com.example</groupId>\n\
        \x20   <artifactId>app</artifactId>\n\
        \x20   <version>1.0</version>\n\
        \x20   <!-- managed versions -->\n\
        \x20   <dependencyManagement>\n\
        \x20       <dependencies>\n\
        \x20           <dependency>\n\
        \x20               <groupId>g</groupId>\n\
        \x20               <artifactId>a</artifactId>\n\
        \x20           </dependency>\n\
        \x20       </dependencies>\n\
        \x20   </dependencyManagement>\n\
        </project>\n";

    let first = parser::parse_str(content, Path::new("pom.xml")).unwrap();
    let serialized = writer::serialize(&first);
    let second = parser::parse_str(&serialized, Path::new("pom.xml")).unwrap();

    assert_eq!(
        first.text_content(first.root()),
        second.text_content(second.root())
    );
    assert_eq!(first.doc_children().len(), second.doc_children().len());
    assert_structure_eq(&first, first.root(), &second, second.root());

    // A second round trip is byte-stable
    assert_eq!(serialized, writer::serialize(&second));
}

fn assert_structure_eq(
    a: &pommel::Document,
    an: pommel::NodeId,
    b: &pommel::Document,
    bn: pommel::NodeId,
) {
    assert_eq!(a.kind(an), b.kind(bn));
    assert_eq!(a.name(an), b.name(bn));
    assert_eq!(a.attributes(an), b.attributes(bn));
    assert_eq!(a.text(an), b.text(bn));
    assert_eq!(a.children(an).len(), b.children(bn).len());
    for (&x, &y) in a.children(an).iter().zip(b.children(bn).iter()) {
        assert_structure_eq(a, x, b, y);
    }
}

#[test]
fn test_position_monotonicity_over_reactor_descriptor() {
    let content = "<project>\n\
        \x20   <properties><a>1</a><b>2</b></properties>\n\
        \x20   <dependencies>\n\
        \x20       <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\n\
        \x20   </dependencies>\n\
        </project>\n";
    let doc = parser::parse_str(content, Path::new("pom.xml")).unwrap();

    for id in doc.descendants(doc.root()) {
        let pos = doc.position(id);
        assert!((pos.start_line, pos.start_col) <= (pos.end_line, pos.end_col));
        if let Some(parent) = doc.parent(id) {
            assert!(
                doc.position(parent).contains(&pos),
                "<{}> escapes its parent's span",
                doc.name(id)
            );
        }
    }
}

#[test]
fn test_checker_output_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project><groupId>g</groupId><version>1.0</version>\
         <modules><module>b-mod</module><module>a-mod</module></modules>\
         <properties><unused1>x</unused1><unused2>y</unused2></properties></project>",
    );
    write_pom(
        &tmp.path().join("b-mod"),
        "<project><version>0.9</version></project>",
    );
    write_pom(
        &tmp.path().join("a-mod"),
        "<project><version>0.8</version></project>",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let run = || {
        let report = Engine::new(RuleRegistry::builtin())
            .check(&reactor, &empty_cache())
            .unwrap();
        TextFormatter::new().without_color().format(&report)
    };

    assert_eq!(run(), run());
}

#[test]
fn test_fix_then_check_is_clean_and_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project>\n\
         \x20   <groupId>com.example</groupId>\n\
         \x20   <version>1.0</version>\n\
         \x20   <dependencyManagement>\n\
         \x20       <dependencies>\n\
         \x20           <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\n\
         \x20           <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\n\
         \x20       </dependencies>\n\
         \x20   </dependencyManagement>\n\
         </project>\n",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let fix_engine = engine(&["dedupe-dependencies"]);

    let first = fix_engine.fix(&reactor, &empty_cache()).unwrap();
    assert_eq!(first.projects_modified(), 1);

    // The corrected state is detected and nothing is rewritten again
    let second = fix_engine.fix(&reactor, &empty_cache()).unwrap();
    assert_eq!(second.projects_modified(), 0);

    let report = engine(&["duplicate-dependencies"])
        .check(&reactor, &empty_cache())
        .unwrap();
    assert!(!report.has_violations());

    let rewritten = std::fs::read_to_string(tmp.path().join("pom.xml")).unwrap();
    assert_eq!(rewritten.matches("<dependency>").count(), 1);
}

#[test]
fn test_fixers_run_in_order_over_multi_module_reactor() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project><groupId>g</groupId><version>3.0</version>\
         <modules><module>core</module></modules></project>",
    );
    write_pom(
        &tmp.path().join("core"),
        "<project>\
         <version>1.0</version>\
         <dependencies>\
         <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
         <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
         </dependencies></project>",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let outcome = Engine::new(RuleRegistry::builtin())
        .fix(&reactor, &empty_cache())
        .unwrap();

    // Both fixers touched the module; it counts once
    assert_eq!(outcome.projects_modified(), 1);
    assert!(outcome.rule_errors.is_empty());

    let rewritten = std::fs::read_to_string(tmp.path().join("core/pom.xml")).unwrap();
    assert_eq!(rewritten.matches("<dependency>").count(), 1);
    assert!(rewritten.contains("<version>3.0</version>"));
}

#[test]
fn test_ignored_project_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project><groupId>g</groupId><version>1.0</version>\
         <modules><module>legacy</module></modules></project>",
    );
    write_pom(
        &tmp.path().join("legacy"),
        "<project><version>0.1</version></project>",
    );
    std::fs::write(tmp.path().join(".pommelignore"), "legacy\n").unwrap();

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let ignore = pommel::load_ignore_list(tmp.path());
    let report = Engine::new(RuleRegistry::builtin())
        .with_ignore(ignore)
        .with_active(&["module-versions".to_string()])
        .check(&reactor, &empty_cache())
        .unwrap();

    assert!(!report.has_violations());
}

#[test]
fn test_configuration_layer_reaches_checkers() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project><groupId>com.example</groupId><version>1.0</version>\
         <properties><deploy.key>x</deploy.key></properties></project>",
    );
    std::fs::write(
        tmp.path().join(".pommel.yaml"),
        "unused-properties.exclude:\n  - deploy.key\n",
    )
    .unwrap();

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let cache = RulesCache::layered(None, Some(tmp.path().join(".pommel.yaml")));

    let report = engine(&["unused-properties"]).check(&reactor, &cache).unwrap();
    assert!(!report.has_violations());

    // Without the layer the property is flagged
    let report = engine(&["unused-properties"])
        .check(&reactor, &empty_cache())
        .unwrap();
    assert_eq!(report.ledger.total(), 1);
}

#[test]
fn test_malformed_module_reported_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    write_pom(
        tmp.path(),
        "<project><groupId>g</groupId><version>1.0</version>\
         <modules><module>broken</module><module>fine</module></modules></project>",
    );
    std::fs::create_dir_all(tmp.path().join("broken")).unwrap();
    std::fs::write(tmp.path().join("broken/pom.xml"), "<project><a></project>").unwrap();
    write_pom(
        &tmp.path().join("fine"),
        "<project><version>0.5</version></project>",
    );

    let reactor = Reactor::discover(tmp.path()).unwrap();
    let report = engine(&["module-versions"])
        .check(&reactor, &empty_cache())
        .unwrap();

    // The broken module is a per-project failure; the healthy one is
    // still checked
    let broken = report
        .ledger
        .violations_for(Path::new("broken/pom.xml"))
        .unwrap();
    assert_eq!(broken[0].line, 0);
    let fine = report
        .ledger
        .violations_for(Path::new("fine/pom.xml"))
        .unwrap();
    assert_eq!(fine.len(), 1);
}
