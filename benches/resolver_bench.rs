//! Name resolution benchmarks.
//!
//! Measures each resolver stage and how lookups scale with block depth.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dynscope::common::Span;
use dynscope::resolver::{
    CatalogBuilder, MemberDef, NameRequest, NameResolver, ResolverOptions, ScopeChain,
    TypeCatalog, TypeDecl, TypeId, TypeRef, TypeScopeStack,
};

fn catalog() -> (TypeCatalog, TypeId) {
    let mut builder = CatalogBuilder::new();
    let game = builder.namespace_path("game");
    let root = builder.add_type(TypeDecl::class("_root"));
    builder.add_member(root, MemberDef::method("trace", TypeRef::OBJECT).into_static());
    let player = builder.add_type(TypeDecl::class("Player").in_namespace(game));
    for i in 0..64 {
        builder.add_member(player, MemberDef::field(&format!("field{i}"), TypeRef::NUMBER));
    }
    builder.add_member(player, MemberDef::field("score", TypeRef::NUMBER));
    builder.add_type(TypeDecl::class("Enemy").in_namespace(game));
    (builder.build(), player)
}

fn bench_stages(c: &mut Criterion) {
    let (catalog, player) = catalog();
    let mut scopes = ScopeChain::new("bench.as");
    scopes
        .define_local("hp", Some(TypeRef::NUMBER), Span::at(0, 2))
        .expect("local");
    let types = TypeScopeStack::for_type(&catalog, player);

    let mut group = c.benchmark_group("stages");
    for name in ["int", "hp", "score", "trace", "Enemy", "game", "missing"] {
        group.bench_with_input(BenchmarkId::new("resolve", name), &name, |b, &name| {
            let mut resolver = NameResolver::new(&catalog, ResolverOptions::default());
            let request = NameRequest::new(name, Span::at(10, name.len() as u32));
            b.iter(|| black_box(resolver.resolve(&request, &scopes, &types).is_ok()))
        });
    }
    group.finish();
}

fn bench_block_depth(c: &mut Criterion) {
    let (catalog, player) = catalog();
    let types = TypeScopeStack::for_type(&catalog, player);

    let mut group = c.benchmark_group("block_depth");
    for &depth in &[1usize, 8, 32, 128] {
        let mut scopes = ScopeChain::new("bench.as");
        scopes
            .define_local("outer", None, Span::at(0, 5))
            .expect("local");
        for i in 0..depth {
            scopes.enter_block();
            scopes
                .define_local(&format!("v{i}"), None, Span::at(i as u32 + 10, 2))
                .expect("local");
        }

        group.bench_with_input(BenchmarkId::new("outermost", depth), &scopes, |b, scopes| {
            let mut resolver = NameResolver::new(&catalog, ResolverOptions::default());
            let request = NameRequest::new("outer", Span::at(500, 5));
            b.iter(|| black_box(resolver.resolve(&request, scopes, &types).is_ok()))
        });
    }
    group.finish();
}

criterion_group!(resolver_benches, bench_stages, bench_block_depth);
criterion_main!(resolver_benches);
