use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Error, Expr, Ident, ItemFn, Meta, ReturnType, Token, Type};

/// Settings of `RuntimeConfig` that may be overridden from the attribute.
const OVERRIDES: &[&str] = &["worker_threads", "stack_size", "thread_name"];

/// Preset plus `with_*` overrides, e.g. `simulation, worker_threads = 8`.
#[derive(Default)]
struct MainArgs {
    preset: Option<Ident>,
    overrides: Vec<(Ident, Expr)>,
}

impl MainArgs {
    fn parse(args: TokenStream) -> syn::Result<Self> {
        let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
        let mut parsed = Self::default();

        for meta in metas {
            match meta {
                Meta::Path(path) => {
                    let ident = path.require_ident()?.clone();
                    if parsed.preset.replace(ident.clone()).is_some() {
                        return Err(Error::new_spanned(ident, "Only one runtime preset may be given"));
                    }
                },
                Meta::NameValue(pair) => {
                    let key = pair.path.require_ident()?.clone();
                    if !OVERRIDES.contains(&key.to_string().as_str()) {
                        return Err(Error::new_spanned(
                            key,
                            format!("Unknown runtime setting. Use one of: {}", OVERRIDES.join(", ")),
                        ));
                    }
                    parsed.overrides.push((key, pair.value));
                },
                Meta::List(list) => {
                    return Err(Error::new_spanned(list, "Expected a preset name or `setting = value`"));
                },
            }
        }
        Ok(parsed)
    }

    /// The expression building the `RuntimeConfig`. The preset resolves to the
    /// associated constructor of the same name, so an unknown preset fails to compile.
    fn config_expr(&self) -> TokenStream {
        let preset = self.preset.clone().unwrap_or_else(|| format_ident!("default"));
        let setters = self.overrides.iter().map(|(key, value)| {
            let setter = format_ident!("with_{}", key);
            quote! { .#setter(#value) }
        });
        quote! { ::strata_runtime::RuntimeConfig::#preset() #(#setters)* }
    }
}

/// Expands the `#[strata_runtime::main]` attribute macro.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if let Err(err) = check_signature(&input) {
        return err.to_compile_error();
    }
    let args = match MainArgs::parse(args) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn { attrs, vis, sig, block } = input;
    let name = &sig.ident;
    let output = &sig.output;
    let config = args.config_expr();

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let config = #config;
            ::strata_runtime::build_runtime_with_config(&config)?.block_on(async #block)
        }
    }
}

fn check_signature(input: &ItemFn) -> syn::Result<()> {
    if input.sig.asyncness.is_none() {
        return Err(Error::new_spanned(&input.sig.fn_token, "`#[strata_runtime::main]` needs an `async fn`"));
    }
    if !input.sig.inputs.is_empty() {
        return Err(Error::new_spanned(&input.sig.inputs, "`#[strata_runtime::main]` takes no arguments"));
    }

    let is_result = match &input.sig.output {
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(path) => path.path.segments.last().is_some_and(|seg| seg.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    };
    if is_result {
        Ok(())
    } else {
        Err(Error::new_spanned(&input.sig, "`#[strata_runtime::main]` must return a `Result`"))
    }
}
