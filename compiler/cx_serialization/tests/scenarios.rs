//! End-to-end tests: build an AST, write it as a module, load it into a
//! fresh context and inspect what came back.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use cx_ir::decl::{StorageClass, TagKind};
use cx_ir::stmt::StmtKind;
use cx_ir::{
    AstContext, DeclId, ExprId, ExprKind, FunctionBody, NameRefParts, QualType, SourceLocation,
    TypeId,
};
use cx_serialization::{
    AstReader, AstWriter, GlobalModuleIndex, IdSpaceKind, ModuleCache, ModuleKind, ModuleManager,
    ReaderOptions, WriterOptions,
};
use pretty_assertions::assert_eq;

fn int() -> QualType {
    TypeId::INT.into()
}

fn write(
    ctx: &AstContext,
    manager: Option<&ModuleManager>,
    name: &str,
    options: WriterOptions,
) -> Vec<u8> {
    AstWriter::new(ctx, manager, options).write_module(name).unwrap()
}

fn plain() -> WriterOptions {
    WriterOptions {
        use_abbreviations: false,
        ..WriterOptions::default()
    }
}

fn both_layouts() -> [WriterOptions; 2] {
    [WriterOptions::default(), plain()]
}

/// `int f(void) { return <value>; }` built by `make_value`.
fn function_returning(
    ctx: &mut AstContext,
    name: &str,
    make_value: impl FnOnce(&mut AstContext) -> ExprId,
) -> DeclId {
    let tu = ctx.translation_unit();
    let fn_ty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, name, fn_ty, &[], StorageClass::None, SourceLocation::INVALID);
    let value = make_value(ctx);
    let ret = ctx.alloc_stmt(
        StmtKind::Return {
            value: Some(value),
            nrvo_candidate: None,
        },
        SourceLocation::INVALID,
    );
    let body = ctx.create_compound(&[ret], SourceLocation::INVALID, SourceLocation::INVALID);
    ctx.decl_mut(f).data.function_mut().unwrap().body = FunctionBody::Present(body);
    f
}

fn returned_value(reader: &mut AstReader<'_>, f: DeclId) -> ExprId {
    let body = reader.function_body(f).unwrap().unwrap();
    let ctx = reader.context();
    let [ret] = ctx.compound_body(body) else {
        panic!("expected one statement");
    };
    match ctx.stmt(*ret).kind {
        StmtKind::Return { value: Some(v), .. } => v,
        ref other => panic!("expected a return, found {other:?}"),
    }
}

fn lookup_one(reader: &mut AstReader<'_>, name: &str) -> DeclId {
    let found = reader.lookup_name(name, None).unwrap();
    assert_eq!(found.len(), 1, "lookup of `{name}`");
    found[0]
}

#[test]
fn integer_literal_round_trips() {
    for options in both_layouts() {
        let mut ctx = AstContext::default();
        function_returning(&mut ctx, "answer", |ctx| {
            ctx.create_integer_literal(42, int(), SourceLocation::INVALID)
        });
        let mut cache = ModuleCache::new();
        cache.insert("answer", write(&ctx, None, "answer", options));

        let mut ctx = AstContext::default();
        let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
        reader.load_module("answer", &cache).unwrap();
        let f = lookup_one(&mut reader, "answer");
        let value = returned_value(&mut reader, f);
        let expr = reader.context().expr(value);
        assert_eq!(expr.kind, ExprKind::IntegerLiteral { value: 42 });
        assert_eq!(expr.ty(), int());
    }
}

#[test]
fn call_with_three_arguments_round_trips() {
    for options in both_layouts() {
        let mut ctx = AstContext::default();
        let tu = ctx.translation_unit();
        let callee_ty = ctx.types.function(int(), &[int(), int(), int()], false);
        let callee = ctx.create_function(
            tu,
            "f",
            callee_ty,
            &[],
            StorageClass::Extern,
            SourceLocation::INVALID,
        );
        function_returning(&mut ctx, "caller", |ctx| {
            let target = ctx.create_decl_ref(callee, SourceLocation::INVALID, NameRefParts::none());
            let args =
                [7, 8, 9].map(|v| ctx.create_integer_literal(v, int(), SourceLocation::INVALID));
            ctx.create_call(target, &args, SourceLocation::INVALID)
        });
        let mut cache = ModuleCache::new();
        cache.insert("calls", write(&ctx, None, "calls", options));

        let mut ctx = AstContext::default();
        let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
        reader.load_module("calls", &cache).unwrap();
        let caller = lookup_one(&mut reader, "caller");
        let f = lookup_one(&mut reader, "f");
        let call = returned_value(&mut reader, caller);
        let ctx = reader.context();
        assert_eq!(ctx.num_args(call), 3);
        for (i, expected) in [7, 8, 9].into_iter().enumerate() {
            assert_eq!(
                ctx.expr(ctx.call_arg(call, i)).kind,
                ExprKind::IntegerLiteral { value: expected }
            );
        }
        match ctx.expr(ctx.callee(call)).kind {
            ExprKind::DeclRef(ref r) => assert_eq!(r.decl, f),
            ref other => panic!("expected a reference to `f`, found {other:?}"),
        }
    }
}

#[test]
fn reference_from_b_resolves_to_the_declaration_in_a() {
    let mut a = AstContext::default();
    let tu = a.translation_unit();
    a.create_var(tu, "origin", int(), StorageClass::Extern, SourceLocation::INVALID);
    let mut cache = ModuleCache::new();
    cache.insert("a", write(&a, None, "a", WriterOptions::default()));

    let mut b = AstContext::default();
    let mut reader = AstReader::new(&mut b, ReaderOptions::default());
    reader.load_module("a", &cache).unwrap();
    let origin = lookup_one(&mut reader, "origin");
    function_returning(reader.context_mut(), "read_origin", |ctx| {
        ctx.create_decl_ref(origin, SourceLocation::INVALID, NameRefParts::none())
    });
    cache.insert(
        "b",
        write(reader.context(), Some(reader.manager()), "b", WriterOptions::default()),
    );

    let mut ctx = AstContext::default();
    let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
    reader.load_module("b", &cache).unwrap();
    let read_origin = lookup_one(&mut reader, "read_origin");
    let value = returned_value(&mut reader, read_origin);
    let referenced = match reader.context().expr(value).kind {
        ExprKind::DeclRef(ref r) => r.decl,
        ref other => panic!("expected a declaration reference, found {other:?}"),
    };

    // The reference is the declaration A defines, not a copy.
    assert_eq!(referenced, lookup_one(&mut reader, "origin"));
    let global = reader.global_decl_id(referenced).unwrap();
    let (owner, _) = reader.manager().owner_of(IdSpaceKind::Decl, global.raw()).unwrap();
    assert_eq!(Some(owner), reader.manager().lookup("a"));
    assert_eq!(reader.get_decl(global).unwrap(), referenced);
    assert_eq!(reader.context().decl_name(referenced), "origin");
}

#[test]
fn variable_chain_split_across_two_modules_shares_one_first_declaration() {
    // A: extern int v; extern int v;
    let mut a = AstContext::default();
    let tu = a.translation_unit();
    let v1 = a.create_var(tu, "v", int(), StorageClass::Extern, SourceLocation::INVALID);
    let v2 = a.create_var(tu, "v", int(), StorageClass::Extern, SourceLocation::INVALID);
    a.set_previous_decl(v2, v1);
    let mut cache = ModuleCache::new();
    cache.insert("a", write(&a, None, "a", WriterOptions::default()));

    // B: int v;  (redeclares A's latest)
    let mut b = AstContext::default();
    let mut reader = AstReader::new(&mut b, ReaderOptions::default());
    reader.load_module("a", &cache).unwrap();
    let loaded = reader.lookup_name("v", None).unwrap();
    assert_eq!(loaded.len(), 2);
    let ctx = reader.context_mut();
    let latest = ctx.most_recent_decl(loaded[0]);
    let tu = ctx.translation_unit();
    let v3 = ctx.create_var(tu, "v", int(), StorageClass::None, SourceLocation::INVALID);
    ctx.set_previous_decl(v3, latest);
    cache.insert(
        "b",
        write(reader.context(), Some(reader.manager()), "b", WriterOptions::default()),
    );

    // Load only B's declaration; the rest of the chain follows.
    let mut index = GlobalModuleIndex::new();
    index.add_module("a", ModuleKind::Module, Vec::new(), std::iter::empty());
    index.add_module("b", ModuleKind::Module, vec!["a".to_owned()], ["v"]);

    let mut ctx = AstContext::default();
    let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
    reader.load_module("b", &cache).unwrap();
    let last = reader.lookup_name("v", Some(&index)).unwrap();
    assert_eq!(last.len(), 1);
    let ctx = reader.context();
    let chain: Vec<DeclId> = ctx.redecls(last[0]).collect();
    assert_eq!(chain.len(), 3);
    let first = ctx.first_decl(last[0]);
    for &d in &chain {
        assert_eq!(ctx.first_decl(d), first);
        assert_eq!(ctx.most_recent_decl(d), last[0]);
    }
    let previous = ctx.previous_decl(last[0]).unwrap();
    assert_eq!(ctx.previous_decl(previous), Some(first));
    assert_eq!(ctx.previous_decl(first), None);
}

#[test]
fn self_referential_record_round_trips_in_both_layouts() {
    for options in both_layouts() {
        let mut ctx = AstContext::default();
        let tu = ctx.translation_unit();
        let node = ctx.create_record(tu, TagKind::Struct, "node", SourceLocation::INVALID);
        let node_ty = ctx.types.record(node);
        let link = ctx.types.pointer(node_ty);
        ctx.create_field(node, "next", link, None, SourceLocation::INVALID);
        let mut cache = ModuleCache::new();
        cache.insert("list", write(&ctx, None, "list", options));

        let mut ctx = AstContext::default();
        let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
        reader.load_module("list", &cache).unwrap();
        let node = lookup_one(&mut reader, "node");
        let ctx = reader.context();
        let fields = &ctx.decl(node).data.tag().unwrap().context.decls;
        assert_eq!(fields.len(), 1);
        let pointee = ctx.types.pointee(ctx.decl(fields[0]).value_type().unwrap()).unwrap();
        assert_eq!(ctx.types.as_record(pointee), Some(node));
    }
}

#[test]
fn modules_on_disk_load_through_the_cache_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    ctx.create_var(tu, "stored", int(), StorageClass::None, SourceLocation::INVALID);
    let path = dir.path().join(format!("disk.{}", cx_serialization::MODULE_FILE_EXTENSION));
    std::fs::write(&path, write(&ctx, None, "disk", WriterOptions::default())).unwrap();

    let cache = ModuleCache::new().with_directory(dir.path());
    let mut ctx = AstContext::default();
    let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
    reader.load_module("disk", &cache).unwrap();
    let stored = lookup_one(&mut reader, "stored");
    assert_eq!(reader.context().decl(stored).value_type(), Some(int()));
}
