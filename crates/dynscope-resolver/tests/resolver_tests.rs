use super::*;
use crate::catalog::{CatalogBuilder, MemberDef, TypeDecl, Visibility};
use crate::resolution::lookup_restrictions::{EXCLUDE_EXTENSIONS, INVOCABLE_ONLY};
use dynscope_common::DiagnosticBag;

struct Fixture {
    catalog: TypeCatalog,
    game: NamespaceId,
    player: TypeId,
    stats: TypeId,
    inner: TypeId,
    global_x: TypeId,
    root_container: TypeId,
    log_container: TypeId,
    list: TypeId,
    boxed: TypeId,
}

fn fixture() -> Fixture {
    let mut b = CatalogBuilder::new();
    let game = b.namespace_path("game");

    let global_x = b.add_type(TypeDecl::class("x"));
    let list = b.add_type(TypeDecl::class("List").generic(&["T"]));

    let root_container = b.add_type(TypeDecl::class("_root"));
    b.add_member(
        root_container,
        MemberDef::method("trace", TypeRef::Builtin(BuiltinType::Void)).into_static(),
    );
    b.add_member(root_container, MemberDef::field("stage", TypeRef::OBJECT).into_static());
    b.add_member(root_container, MemberDef::field("score", TypeRef::NUMBER).into_static());
    b.add_member(root_container, MemberDef::field("log", TypeRef::OBJECT).into_static());
    b.add_member(root_container, MemberDef::field("fps", TypeRef::NUMBER).into_static());
    b.add_member(
        root_container,
        MemberDef::method("shuffle", TypeRef::Dynamic).into_extension(),
    );

    let log_container = b.add_type(TypeDecl::class("log_fn"));
    b.add_member(
        log_container,
        MemberDef::method("log", TypeRef::Builtin(BuiltinType::Void)).into_static(),
    );
    // A `_fn` container without the matching member falls through.
    let fps_container = b.add_type(TypeDecl::class("fps_fn"));
    b.add_member(fps_container, MemberDef::field("other", TypeRef::NUMBER).into_static());

    let player = b.add_type(TypeDecl::class("Player").in_namespace(game));
    b.add_member(player, MemberDef::field("score", TypeRef::NUMBER));
    b.add_member(player, MemberDef::field("stage", TypeRef::OBJECT));
    b.add_member(player, MemberDef::field("count", TypeRef::NUMBER).into_static());
    b.add_member(player, MemberDef::method("tick", TypeRef::NUMBER));
    b.add_member(player, MemberDef::method("create", TypeRef::Dynamic).into_static());
    let stats = b.add_type(TypeDecl::class("Stats").nested_in(player));
    let inner = b.add_type(TypeDecl::class("Inner").nested_in(player));
    b.add_member(inner, MemberDef::field("depth", TypeRef::NUMBER));

    let boxed = b.add_type(TypeDecl::class("Box").in_namespace(game).generic(&["T"]));
    b.add_member(boxed, MemberDef::field("value", TypeRef::Dynamic));

    Fixture {
        catalog: b.build(),
        game,
        player,
        stats,
        inner,
        global_x,
        root_container,
        log_container,
        list,
        boxed,
    }
}

fn resolver(catalog: &TypeCatalog) -> NameResolver<'_> {
    NameResolver::new(
        catalog,
        ResolverOptions {
            file_name: "Main.as".to_string(),
            ..ResolverOptions::default()
        },
    )
}

fn at(start: u32, name: &str) -> Span {
    Span::at(start, name.len() as u32)
}

// =============================================================================
// Stage 1: locals
// =============================================================================

#[test]
fn test_innermost_local_wins_over_global_type() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.enter_block();
    let x = scopes
        .define_local("x", Some(TypeRef::NUMBER), Span::new(4, 5))
        .expect("declare x");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);

    let mut r = resolver(&f.catalog);
    let resolved = r
        .resolve(&NameRequest::new("x", at(20, "x")), &scopes, &types)
        .expect("x resolves");
    assert_eq!(resolved, ResolvedReference::Local { id: x, forward: false });
    assert_ne!(resolved, ResolvedReference::Type(f.global_x));
}

#[test]
fn test_declared_ancestor_local_resolves() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    let x = scopes.define_local("x", None, Span::new(0, 1)).expect("x");
    scopes.enter_block();
    scopes.enter_block();
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("x", at(30, "x")), &scopes, &types)
        .expect("x resolves");
    assert_eq!(resolved, ResolvedReference::Local { id: x, forward: false });
}

#[test]
fn test_forward_use_in_same_block_resolves_and_is_recorded() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    let total = scopes
        .declare_local("total", Some(TypeRef::NUMBER), Span::new(40, 45))
        .expect("total");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);

    let mut r = resolver(&f.catalog);
    let resolved = r
        .resolve(&NameRequest::new("total", at(10, "total")), &scopes, &types)
        .expect("forward use resolves");
    assert_eq!(resolved, ResolvedReference::Local { id: total, forward: true });
    assert_eq!(r.forward_uses().len(), 1);
    assert_eq!(r.forward_uses()[0].local, total);
    assert_eq!(r.forward_uses()[0].span.start, 10);
    assert_eq!(r.take_forward_uses().len(), 1);
    assert!(r.forward_uses().is_empty());
}

#[test]
fn test_forward_use_recording_can_be_disabled() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.declare_local("total", None, Span::new(40, 45)).expect("total");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = NameResolver::new(
        &f.catalog,
        ResolverOptions {
            record_forward_uses: false,
            ..ResolverOptions::default()
        },
    );
    assert!(r
        .resolve(&NameRequest::new("total", at(10, "total")), &scopes, &types)
        .is_ok());
    assert!(r.forward_uses().is_empty());
}

#[test]
fn test_type_arguments_on_local_are_invalid() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.define_local("items", None, Span::new(0, 5)).expect("items");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let err = resolver(&f.catalog)
        .resolve(
            &NameRequest::new("items", at(12, "items")).with_arity(1),
            &scopes,
            &types,
        )
        .expect_err("type arguments on a local");
    assert_eq!(err.code, diagnostic_codes::VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS);
    assert_eq!(err.file, "Main.as");
}

// =============================================================================
// Compiler aliases
// =============================================================================

#[test]
fn test_compiler_alias_takes_precedence_over_local() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.define_local("Number", None, Span::DUMMY).expect("Number local");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("Number", at(0, "Number")), &scopes, &types)
        .expect("alias");
    assert_eq!(resolved, ResolvedReference::CompilerAlias(BuiltinType::Number));
}

#[test]
fn test_compiler_aliases_can_be_disabled() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    let local = scopes.define_local("int", None, Span::DUMMY).expect("int local");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = NameResolver::new(
        &f.catalog,
        ResolverOptions {
            compiler_aliases: false,
            ..ResolverOptions::default()
        },
    );
    let resolved = r
        .resolve(&NameRequest::new("int", at(0, "int")), &scopes, &types)
        .expect("local");
    assert_eq!(resolved, ResolvedReference::Local { id: local, forward: false });
}

// =============================================================================
// Stage 2: enclosing type members
// =============================================================================

#[test]
fn test_enclosing_member_precedes_global() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("stage", at(0, "stage")), &scopes, &types)
        .expect("stage");
    match resolved {
        ResolvedReference::Member(member) => {
            assert_eq!(member.declaring_type, f.player);
            assert_eq!(member.level, 0);
            assert!(!member.is_static);
        }
        other => panic!("expected member, got {other:?}"),
    }
}

#[test]
fn test_method_group_is_collected() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player).in_static_context(true);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("tick", at(0, "tick")), &scopes, &types)
        .expect("method group resolves even from a static body");
    match resolved {
        ResolvedReference::Member(member) => {
            assert!(member.is_method_group);
            assert_eq!(member.members.len(), 1);
        }
        other => panic!("expected member, got {other:?}"),
    }
}

#[test]
fn test_instance_field_in_static_context_is_invalid() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player).in_static_context(true);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("score", at(3, "score")), &scopes, &types)
        .expect_err("no this in static body");
    assert_eq!(
        err.code,
        diagnostic_codes::OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER
    );
    assert!(err.message_text.contains("game.Player.score"));
}

#[test]
fn test_static_member_of_outer_type_is_reachable_from_nested_type() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.inner);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("count", at(0, "count")), &scopes, &types)
        .expect("outer static");
    match resolved {
        ResolvedReference::Member(member) => {
            assert_eq!(member.declaring_type, f.player);
            assert_eq!(member.level, 1);
            assert!(member.is_static);
        }
        other => panic!("expected member, got {other:?}"),
    }
}

#[test]
fn test_first_matching_level_wins_even_when_invalid() {
    // `score` is an instance field of the outer type and also a global.
    // The outer level matches, the match is invalid, and the global is
    // never considered.
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.inner);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("score", at(0, "score")), &scopes, &types)
        .expect_err("outer instance member");
    assert_eq!(
        err.code,
        diagnostic_codes::CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE
    );
    assert!(err.message_text.contains("game.Player"));
    assert!(err.message_text.contains("game.Player.Inner"));
}

#[test]
fn test_nested_type_member_defers_to_type_resolution() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("Stats", at(0, "Stats")), &scopes, &types)
        .expect("nested type");
    assert_eq!(resolved, ResolvedReference::Type(f.stats));
}

#[test]
fn test_private_base_member_is_not_matched_from_subclass() {
    let mut b = CatalogBuilder::new();
    let base = b.add_type(TypeDecl::class("Base"));
    b.add_member(
        base,
        MemberDef::field("hidden", TypeRef::NUMBER).with_visibility(Visibility::Private),
    );
    let derived = b.add_type(TypeDecl::class("Derived").extends(base));
    let catalog = b.build();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&catalog, derived);
    let err = resolver(&catalog)
        .resolve(&NameRequest::new("hidden", at(0, "hidden")), &scopes, &types)
        .expect_err("private base member");
    assert_eq!(err.code, diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT);
}

// =============================================================================
// Stage 3: globals
// =============================================================================

#[test]
fn test_function_suffixed_container_is_tried_first() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("log", at(0, "log")), &scopes, &types)
        .expect("log");
    match resolved {
        ResolvedReference::Global(member) => assert_eq!(member.declaring_type, f.log_container),
        other => panic!("expected global, got {other:?}"),
    }
}

#[test]
fn test_catch_all_container_holds_remaining_globals() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = resolver(&f.catalog);
    for name in ["trace", "fps"] {
        match r.resolve(&NameRequest::new(name, at(0, name)), &scopes, &types) {
            Ok(ResolvedReference::Global(member)) => {
                assert_eq!(member.declaring_type, f.root_container, "{name}");
                assert!(member.is_static);
            }
            other => panic!("expected global for {name}, got {other:?}"),
        }
    }
}

#[test]
fn test_globals_are_visible_from_namespaced_types() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("trace", at(0, "trace")), &scopes, &types)
        .expect("trace");
    assert!(matches!(resolved, ResolvedReference::Global(_)));
}

#[test]
fn test_extension_candidates_can_be_excluded() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = resolver(&f.catalog);
    assert!(matches!(
        r.resolve(&NameRequest::new("shuffle", at(0, "shuffle")), &scopes, &types),
        Ok(ResolvedReference::Global(_))
    ));
    let err = r
        .resolve(
            &NameRequest::new("shuffle", at(0, "shuffle")).with_restrictions(EXCLUDE_EXTENSIONS),
            &scopes,
            &types,
        )
        .expect_err("extension excluded");
    assert_eq!(err.code, diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT);
}

// =============================================================================
// Stage 4: types and namespaces
// =============================================================================

#[test]
fn test_global_type_resolves_when_nothing_else_matches() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("x", at(0, "x")), &scopes, &types)
        .expect("type x");
    assert_eq!(resolved, ResolvedReference::Type(f.global_x));
}

#[test]
fn test_generic_type_requires_matching_arity() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = resolver(&f.catalog);
    assert_eq!(
        r.resolve(&NameRequest::new("List", at(0, "List")).with_arity(1), &scopes, &types),
        Ok(ResolvedReference::Type(f.list))
    );
    assert!(r
        .resolve(&NameRequest::new("List", at(0, "List")), &scopes, &types)
        .is_err());
}

#[test]
fn test_namespace_resolves() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("game", at(0, "game")), &scopes, &types)
        .expect("namespace");
    assert_eq!(resolved, ResolvedReference::Namespace(f.game));
}

#[test]
fn test_imported_namespace_types_resolve() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let mut r = resolver(&f.catalog);
    let bare = TypeScopeStack::top_level(NamespaceId::ROOT);
    assert!(r
        .resolve(&NameRequest::new("Player", at(0, "Player")), &scopes, &bare)
        .is_err());
    let imported = TypeScopeStack::top_level(NamespaceId::ROOT).with_imports(vec![f.game]);
    assert_eq!(
        r.resolve(&NameRequest::new("Player", at(0, "Player")), &scopes, &imported),
        Ok(ResolvedReference::Type(f.player))
    );
}

#[test]
fn test_type_parameters_resolve() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.boxed).with_method_type_parameters(&["U"]);
    let mut r = resolver(&f.catalog);
    assert_eq!(
        r.resolve(&NameRequest::new("T", at(0, "T")), &scopes, &types),
        Ok(ResolvedReference::TypeParameter(TypeParameterRef::Type {
            owner: f.boxed,
            index: 0
        }))
    );
    assert_eq!(
        r.resolve(&NameRequest::new("U", at(0, "U")), &scopes, &types),
        Ok(ResolvedReference::TypeParameter(TypeParameterRef::Method { index: 0 }))
    );
}

#[test]
fn test_invocable_only_skips_types() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let err = resolver(&f.catalog)
        .resolve(
            &NameRequest::new("x", at(0, "x")).with_restrictions(INVOCABLE_ONLY),
            &scopes,
            &types,
        )
        .expect_err("types are not invocable");
    assert_eq!(err.code, diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT);
}

#[test]
fn test_invoking_non_invocable_member_is_reported() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let err = resolver(&f.catalog)
        .resolve(
            &NameRequest::new("score", at(0, "score")).with_restrictions(INVOCABLE_ONLY),
            &scopes,
            &types,
        )
        .expect_err("field is not invocable");
    assert_eq!(err.code, diagnostic_codes::MEMBER_GROUP_IS_NOT_INVOCABLE);
}

// =============================================================================
// Ambiguity and failures
// =============================================================================

#[test]
fn test_pending_ancestor_local_conflicts_with_type() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    // `var x` appears later in the outer block; the reference sits in a child block.
    scopes
        .declare_local("x", Some(TypeRef::NUMBER), Span::new(50, 51))
        .expect("x");
    scopes.enter_block();
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("x", at(12, "x")), &scopes, &types)
        .expect_err("ambiguous");
    assert_eq!(
        err.code,
        diagnostic_codes::NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK
    );
    assert_eq!(err.start, 12);
    assert_eq!(err.related_information.len(), 1);
    assert_eq!(err.related_information[0].start, 50);
}

#[test]
fn test_pending_ancestor_local_conflicts_with_nested_type() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.declare_local("Stats", None, Span::new(50, 55)).expect("Stats");
    scopes.enter_block();
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("Stats", at(12, "Stats")), &scopes, &types)
        .expect_err("ambiguous");
    assert_eq!(
        err.code,
        diagnostic_codes::NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK
    );
}

#[test]
fn test_pending_ancestor_local_without_type_is_used_before_declared() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.declare_local("later", None, Span::new(50, 55)).expect("later");
    scopes.enter_block();
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("later", at(12, "later")), &scopes, &types)
        .expect_err("used before declared");
    assert_eq!(err.code, diagnostic_codes::LOCAL_VARIABLE_USED_BEFORE_DECLARED);
}

#[test]
fn test_pending_ancestor_local_does_not_block_members() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    scopes.declare_local("score", None, Span::new(50, 55)).expect("score");
    scopes.enter_block();
    let types = TypeScopeStack::for_type(&f.catalog, f.player);
    let resolved = resolver(&f.catalog)
        .resolve(&NameRequest::new("score", at(12, "score")), &scopes, &types)
        .expect("member");
    assert!(matches!(resolved, ResolvedReference::Member(_)));
}

#[test]
fn test_unresolved_identifier_carries_name_and_location() {
    let f = fixture();
    let scopes = ScopeChain::new("Main.as");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let err = resolver(&f.catalog)
        .resolve(&NameRequest::new("missing", Span::new(7, 14)), &scopes, &types)
        .expect_err("unresolved");
    assert_eq!(err.code, diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT);
    assert_eq!(err.start, 7);
    assert_eq!(err.length, 7);
    assert!(err.message_text.contains("missing"));
}

#[test]
fn test_resolve_into_continues_after_failures() {
    let f = fixture();
    let mut scopes = ScopeChain::new("Main.as");
    let y = scopes.define_local("y", None, Span::DUMMY).expect("y");
    let types = TypeScopeStack::top_level(NamespaceId::ROOT);
    let mut r = resolver(&f.catalog);
    let mut bag = DiagnosticBag::new();

    let results: Vec<Option<ResolvedReference>> = ["a", "b", "y"]
        .iter()
        .map(|name| r.resolve_into(&NameRequest::new(name, at(0, name)), &scopes, &types, &mut bag))
        .collect();

    assert_eq!(results[0], None);
    assert_eq!(results[1], None);
    assert_eq!(results[2], Some(ResolvedReference::Local { id: y, forward: false }));
    assert_eq!(bag.codes(), vec![103, 103]);
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: ResolverOptions =
        serde_json::from_str(r#"{ "globalsContainer": "Globals" }"#).expect("options");
    assert_eq!(options.globals_container, "Globals");
    assert_eq!(options.function_suffix, "_fn");
    assert!(options.compiler_aliases);
}

#[test]
fn test_parallel_resolution_over_shared_catalog() {
    use rayon::prelude::*;
    let f = fixture();
    let names = ["trace", "log", "x", "game", "missing"];
    let resolved: Vec<bool> = (0..200)
        .into_par_iter()
        .map(|i| {
            let name = names[i % names.len()];
            let scopes = ScopeChain::new("Main.as");
            let types = TypeScopeStack::top_level(NamespaceId::ROOT);
            resolver(&f.catalog)
                .resolve(&NameRequest::new(name, at(0, name)), &scopes, &types)
                .is_ok()
        })
        .collect();
    for (i, ok) in resolved.iter().enumerate() {
        assert_eq!(*ok, names[i % names.len()] != "missing");
    }
}
