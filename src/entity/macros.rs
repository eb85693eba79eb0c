/// Declares a collection record and its [`Record`](crate::Record) implementation.
///
/// Declarations must appear in order: one `key`, then `field`s, then to-one
/// `relation`s, then to-many `relations`. Each maps a Rust field to its wire
/// name.
///
/// ```ignore
/// directus_record! {
///     pub struct Product in "product" {
///         key id: Uuid => "id";
///         field name: String => "name";
///         field description: Option<String> => "description";
///         relation location: Location => "location";
///     }
/// }
/// ```
///
/// The expansion refers to `::serde` and `::serde_json`, so both must be
/// dependencies of the calling crate.
#[macro_export]
macro_rules! directus_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $collection:literal {
            key $id:ident : $id_ty:ty => $id_wire:literal;
            $( field $field:ident : $field_ty:ty => $field_wire:literal; )*
            $( relation $rel:ident : $rel_ty:ty => $rel_wire:literal; )*
            $( relations $many:ident : $many_ty:ty => $many_wire:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            #[serde(rename = $id_wire)]
            pub $id: $id_ty,
            $(
                #[serde(rename = $field_wire)]
                pub $field: $field_ty,
            )*
            $(
                #[serde(rename = $rel_wire)]
                pub $rel: ::core::option::Option<$crate::Entity<$rel_ty>>,
            )*
            $(
                #[serde(rename = $many_wire)]
                pub $many: ::std::vec::Vec<$crate::Entity<$many_ty>>,
            )*
        }

        impl $crate::Record for $name {
            const COLLECTION: &'static str = $collection;

            fn identity(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.$id)
            }

            fn reference(&self) -> $crate::Result<::serde_json::Value> {
                ::core::result::Result::Ok(::serde_json::to_value(&self.$id)?)
            }

            fn from_reference(reference: ::serde_json::Value) -> $crate::Result<Self> {
                ::core::result::Result::Ok(Self {
                    $id: ::serde_json::from_value(reference)?,
                    ..::core::default::Default::default()
                })
            }

            fn diff(&self, prior: &Self) -> $crate::Result<$crate::ChangeSet> {
                let mut changes = $crate::ChangeSet::new();
                changes.track($id_wire, &self.$id, &prior.$id)?;
                $(
                    changes.track($field_wire, &self.$field, &prior.$field)?;
                )*
                $(
                    changes.track_relation($rel_wire, self.$rel.as_ref(), prior.$rel.as_ref())?;
                )*
                ::core::result::Result::Ok(changes)
            }

            fn related(&self) -> ::std::vec::Vec<$crate::DynEntity> {
                #[allow(unused_mut)]
                let mut related: ::std::vec::Vec<$crate::DynEntity> = ::std::vec::Vec::new();
                $(
                    if let ::core::option::Option::Some(entity) = &self.$rel {
                        related.push(entity.as_tracked());
                    }
                )*
                $(
                    related.extend(self.$many.iter().map(|entity| entity.as_tracked()));
                )*
                related
            }
        }
    };
}
