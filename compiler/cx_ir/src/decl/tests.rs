use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_payload_matches_its_class() {
    for &kind in DeclClass::ALL {
        assert_eq!(DeclData::empty(kind).class(), kind);
        let shell = Decl::shell(kind);
        assert_eq!(shell.class(), kind);
        assert_eq!(shell.decl_context(), DeclId::INVALID);
        assert_eq!(shell.redecl, None);
        assert!(!shell.is_definition());
    }
}

#[test]
fn empty_enum_is_tagged_as_enum() {
    let data = DeclData::empty(DeclClass::Enum);
    assert_eq!(data.tag().map(|t| t.tag_kind), Some(TagKind::Enum));
}

#[test]
fn nested_payload_accessors() {
    let ctor = DeclData::CXXConstructor(ConstructorData {
        method: MethodData {
            function: FunctionData {
                params: vec![DeclId::new(4)],
                ..FunctionData::default()
            },
            method_flags: MethodFlags::CONST,
        },
        is_explicit: true,
    });
    assert_eq!(ctor.method().map(|m| m.method_flags), Some(MethodFlags::CONST));
    assert_eq!(ctor.function().map(|f| f.params.clone()), Some(vec![DeclId::new(4)]));
    assert!(ctor.context().is_some());
    assert!(ctor.named().is_some());
    assert_eq!(ctor.var(), None);

    let parm = DeclData::empty(DeclClass::ParmVar);
    assert!(parm.var().is_some());
    assert!(parm.value().is_some());
    assert_eq!(parm.function(), None);
    assert_eq!(parm.context(), None);
}

#[test]
fn unnamed_kinds_have_empty_names() {
    assert_eq!(DeclData::empty(DeclClass::TranslationUnit).named(), None);
    assert_eq!(DeclData::empty(DeclClass::StaticAssert).named(), None);
    assert_eq!(Decl::shell(DeclClass::StaticAssert).name(), Name::EMPTY);
    assert!(DeclData::empty(DeclClass::EnumConstant).named().is_some());
    assert!(DeclData::empty(DeclClass::ClassTemplate).named().is_some());
}

#[test]
fn declaration_contexts_expose_members() {
    let mut ns = DeclData::empty(DeclClass::Namespace);
    if let Some(ctx) = ns.context_mut() {
        ctx.decls.push(DeclId::new(7));
    }
    assert_eq!(ns.context().map(|c| c.decls.clone()), Some(vec![DeclId::new(7)]));
    assert_eq!(DeclData::empty(DeclClass::Field).context(), None);
}

#[test]
fn function_definition_needs_a_body() {
    let mut f = Decl::shell(DeclClass::Function);
    assert!(!f.is_definition());
    if let Some(func) = f.data.function_mut() {
        func.body = FunctionBody::Deferred(BodyOffset { source: 0, bit: 128 });
    }
    assert!(f.is_definition());
    if let Some(func) = f.data.function_mut() {
        func.body = FunctionBody::Present(StmtId::new(0));
    }
    assert!(f.is_definition());
}

#[test]
fn extern_variable_with_initializer_is_not_a_definition() {
    let mut v = Decl::shell(DeclClass::Var);
    if let Some(var) = v.data.var_mut() {
        var.init = Some(ExprId::new(1));
    }
    assert!(v.is_definition());
    if let Some(var) = v.data.var_mut() {
        var.storage = StorageClass::Extern;
    }
    assert!(!v.is_definition());
}

#[test]
fn complete_tag_is_a_definition() {
    let mut r = Decl::shell(DeclClass::Record);
    assert!(!r.is_definition());
    if let DeclData::Record(record) = &mut r.data {
        record.tag.is_complete_definition = true;
    }
    assert!(r.is_definition());
}

#[test]
fn first_of_chain_points_at_itself() {
    let d = DeclId::new(9);
    let link = Redeclarable::first_of_chain(d);
    assert_eq!(link.first, d);
    assert_eq!(link.link, RedeclLink::Latest(d));
}

#[test]
fn header_flags() {
    let mut d = Decl::shell(DeclClass::Var);
    d.flags |= DeclFlags::INVALID | DeclFlags::FROM_AST_FILE;
    assert!(d.is_invalid());
    assert!(d.is_from_ast_file());
    assert!(!d.is_implicit());
    assert!(!d.is_template_parameter());
    assert!(Decl::shell(DeclClass::TemplateTypeParm).is_template_parameter());
}
