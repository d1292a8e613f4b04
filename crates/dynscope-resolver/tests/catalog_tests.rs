use super::*;

fn player_catalog() -> (TypeCatalog, TypeId, TypeId, TypeId) {
    let mut builder = CatalogBuilder::new();
    let game = builder.namespace_path("game.actors");
    let actor = builder.add_type(TypeDecl::class("Actor").in_namespace(game));
    builder.add_member(actor, MemberDef::field("name", TypeRef::STRING));
    builder.add_member(
        actor,
        MemberDef::field("secret", TypeRef::NUMBER).with_visibility(Visibility::Private),
    );
    builder.add_member(
        actor,
        MemberDef::method("tick", TypeRef::Builtin(BuiltinType::Void))
            .with_visibility(Visibility::Protected),
    );
    let player = builder.add_type(TypeDecl::class("Player").in_namespace(game).extends(actor));
    builder.add_member(player, MemberDef::field("score", TypeRef::NUMBER));
    builder.add_member(player, MemberDef::method("tick", TypeRef::NUMBER));
    let stats = builder.add_type(TypeDecl::class("Stats").nested_in(player).generic(&["T"]));
    (builder.build(), actor, player, stats)
}

#[test]
fn test_namespace_path_is_created_once() {
    let mut builder = CatalogBuilder::new();
    let a = builder.namespace_path("flash.display");
    let b = builder.namespace_path("flash.display");
    assert_eq!(a, b);
    let catalog = builder.build();
    assert_eq!(catalog.namespace_path(a), "flash.display");
    assert_eq!(catalog.namespace_chain(a).len(), 3);
}

#[test]
fn test_qualified_name_includes_namespace_and_declaring_type() {
    let (catalog, actor, _, stats) = player_catalog();
    assert_eq!(catalog.qualified_name(actor), "game.actors.Actor");
    assert_eq!(catalog.qualified_name(stats), "game.actors.Player.Stats");
}

#[test]
fn test_nested_type_is_a_member_of_its_declaring_type() {
    let (catalog, _, player, stats) = player_catalog();
    assert_eq!(catalog.find_nested_type(player, "Stats", 1), Some(stats));
    assert_eq!(catalog.find_nested_type(player, "Stats", 0), None);
    let ns = catalog.get_type(player).map(|t| t.namespace).unwrap();
    assert_eq!(catalog.find_type_in_namespace(ns, "Stats", 1), None);
    assert_eq!(catalog.get_type(stats).map(|t| t.namespace), Some(ns));
}

#[test]
fn test_lookup_walks_base_chain() {
    let (catalog, actor, player, _) = player_catalog();
    let found = catalog
        .lookup_members(player, "name", 0, |_, _| true)
        .expect("inherited field");
    assert_eq!(found.found_in, actor);
    assert_eq!(found.members.len(), 1);
}

#[test]
fn test_derived_member_hides_base_member() {
    let (catalog, _, player, _) = player_catalog();
    let found = catalog
        .lookup_members(player, "tick", 0, |_, _| true)
        .expect("tick");
    assert_eq!(found.found_in, player);
}

#[test]
fn test_filter_rejection_continues_to_base() {
    let (catalog, actor, player, _) = player_catalog();
    let found = catalog
        .lookup_members(player, "tick", 0, |owner, _| owner != player)
        .expect("base tick");
    assert_eq!(found.found_in, actor);
}

#[test]
fn test_private_member_accessibility() {
    let (catalog, actor, player, _) = player_catalog();
    let secret = catalog
        .lookup_members(actor, "secret", 0, |_, _| true)
        .expect("secret");
    let def = catalog.member(secret.members[0]).expect("member def");
    assert!(catalog.is_accessible(actor, def, Some(actor)));
    assert!(!catalog.is_accessible(actor, def, Some(player)));
    assert!(!catalog.is_accessible(actor, def, None));
}

#[test]
fn test_protected_member_visible_from_subclass_and_its_nested_types() {
    let (catalog, actor, player, stats) = player_catalog();
    let tick = catalog
        .get_type(actor)
        .and_then(|t| t.members_named("tick").next().map(|(_, m)| m.clone()))
        .expect("tick");
    assert!(catalog.is_accessible(actor, &tick, Some(player)));
    assert!(catalog.is_accessible(actor, &tick, Some(stats)));
    assert!(!catalog.is_accessible(actor, &tick, None));
}

#[test]
fn test_generic_method_matches_arity_zero_reference() {
    let method = MemberDef::method("map", TypeRef::Dynamic).with_arity(1);
    assert!(method.matches_arity(0));
    assert!(method.matches_arity(1));
    assert!(!method.matches_arity(2));
    let field = MemberDef::field("map", TypeRef::Dynamic);
    assert!(!field.matches_arity(1));
}

#[test]
fn test_invocable_members() {
    let mut builder = CatalogBuilder::new();
    let callback = builder.add_type(TypeDecl::new("Callback", TypeKind::Delegate));
    let catalog = builder.build();
    assert!(catalog.is_invocable(&MemberDef::method("run", TypeRef::Dynamic)));
    assert!(catalog.is_invocable(&MemberDef::field("onDone", TypeRef::Named(callback))));
    assert!(catalog.is_invocable(&MemberDef::field(
        "handler",
        TypeRef::Builtin(BuiltinType::Function)
    )));
    assert!(!catalog.is_invocable(&MemberDef::field("count", TypeRef::NUMBER)));
}

#[test]
fn test_dynamic_flag_and_builtin_binding() {
    let mut builder = CatalogBuilder::new();
    let bag = builder.add_type(TypeDecl::class("Bag").dynamic());
    let object = builder.add_type(TypeDecl::class("ObjectImpl"));
    let sealed = builder.add_type(TypeDecl::class("Sealed"));
    builder.bind_builtin(BuiltinType::Object, object);
    let catalog = builder.build();
    assert!(catalog.is_dynamic(bag));
    assert!(catalog.is_dynamic(object));
    assert!(!catalog.is_dynamic(sealed));
    assert_eq!(catalog.builtin_type(BuiltinType::Object), Some(object));
}

#[test]
fn test_catalog_is_shareable_across_threads() {
    use rayon::prelude::*;
    let (catalog, _, player, _) = player_catalog();
    let hits: usize = (0..64)
        .into_par_iter()
        .filter(|_| catalog.lookup_members(player, "score", 0, |_, _| true).is_some())
        .count();
    assert_eq!(hits, 64);
}
