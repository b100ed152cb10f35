// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire notation of serialized expression trees

// Attributes
pub const EXPRESSION_TYPE_ATTRIBUTE: &str = "expressionType";
pub const EXPRESSION_ATTRIBUTE: &str = "expression";
pub const BINDINGS_ATTRIBUTE: &str = "bindings";
pub const INITIALIZERS_ATTRIBUTE: &str = "initializers";
pub const ARGUMENTS_ATTRIBUTE: &str = "arguments";
pub const NEW_ATTRIBUTE: &str = "new";
pub const LEFT_ATTRIBUTE: &str = "left";
pub const RIGHT_ATTRIBUTE: &str = "right";
pub const TEST_ATTRIBUTE: &str = "test";
pub const IF_TRUE_ATTRIBUTE: &str = "ifTrue";
pub const IF_FALSE_ATTRIBUTE: &str = "ifFalse";
pub const TYPE_ATTRIBUTE: &str = "type";
pub const VALUE_ATTRIBUTE: &str = "value";
pub const PROPERTY_OR_FIELD_NAME_ATTRIBUTE: &str = "propertyOrFieldName";
pub const NAME_ATTRIBUTE: &str = "name";
pub const USE_NULL_PROPAGATION_ATTRIBUTE: &str = "useNullPropagation";

// Expression types
pub const EXPRESSION_TYPE_PROPERTY_OR_FIELD: &str = "PropertyOrField";
pub const EXPRESSION_TYPE_MEMBER_RESOLVE: &str = "MemberResolve";
pub const EXPRESSION_TYPE_CONSTANT: &str = "Constant";
pub const EXPRESSION_TYPE_CONVERT: &str = "Convert";
pub const EXPRESSION_TYPE_CONVERT_CHECKED: &str = "ConvertChecked";
pub const EXPRESSION_TYPE_TYPE_AS: &str = "TypeAs";
pub const EXPRESSION_TYPE_TYPE_IS: &str = "TypeIs";
pub const EXPRESSION_TYPE_TYPE_OF: &str = "TypeOf";
pub const EXPRESSION_TYPE_DEFAULT: &str = "Default";
pub const EXPRESSION_TYPE_INVOKE: &str = "Invoke";
pub const EXPRESSION_TYPE_LAMBDA: &str = "Lambda";
pub const EXPRESSION_TYPE_INDEX: &str = "Index";
pub const EXPRESSION_TYPE_NEW: &str = "New";
pub const EXPRESSION_TYPE_NEW_ARRAY_BOUNDS: &str = "NewArrayBounds";
pub const EXPRESSION_TYPE_NEW_ARRAY_INIT: &str = "NewArrayInit";
pub const EXPRESSION_TYPE_MEMBER_INIT: &str = "MemberInit";
pub const EXPRESSION_TYPE_LIST_INIT: &str = "ListInit";
pub const EXPRESSION_TYPE_CONDITION: &str = "Condition";

// Binding types
pub const EXPRESSION_TYPE_ASSIGNMENT_BINDING: &str = "Assignment";
pub const EXPRESSION_TYPE_MEMBER_BINDING: &str = "MemberBinding";
pub const EXPRESSION_TYPE_LIST_BINDING: &str = "ListBinding";
pub const EXPRESSION_TYPE_ELEMENT_INIT_BINDING: &str = "ElementInitBinding";

// Literal names
pub const TRUE_LITERAL: &str = "true";
pub const FALSE_LITERAL: &str = "false";
pub const NULL_LITERAL: &str = "null";

/// Conventional member invoked when the callee is not a member expression
pub const INVOKE_MEMBER_NAME: &str = "Invoke";

/// Member name with a leading verbatim `@` removed
pub fn member_name(raw_name: &str) -> &str {
    raw_name.strip_prefix('@').unwrap_or(raw_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name_strips_verbatim_marker() {
        assert_eq!(member_name("@class"), "class");
        assert_eq!(member_name("Int32Prop"), "Int32Prop");
        assert_eq!(member_name(""), "");
        assert_eq!(member_name("@@x"), "@x");
    }
}
